//! Core types used throughout iqlink.
//!
//! These types provide a hardware-agnostic vocabulary for the frame
//! transport contract: stream direction, clock source selection, gain
//! ranges, and sample-clock timestamps.

use std::fmt;
use std::str::FromStr;

/// Direction of a sample stream or hardware setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Transmit path (host to antenna).
    Tx,
    /// Receive path (antenna to host).
    Rx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Tx => write!(f, "TX"),
            Direction::Rx => write!(f, "RX"),
        }
    }
}

/// The reference clock source a device is disciplined to.
///
/// Selected in [`DeviceConfig`](crate::config::DeviceConfig). The clock
/// source determines what [`is_clock_source_ok()`]
/// (crate::device::SdrDevice::is_clock_source_ok) checks: nothing for
/// `Internal`, the external reference lock for `External`, and both GPS and
/// reference locks for `Gps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClockSource {
    /// The device's own free-running oscillator. Always considered locked.
    #[default]
    Internal,
    /// An external 10 MHz reference input.
    External,
    /// A GPS-disciplined oscillator.
    Gps,
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClockSource::Internal => "internal",
            ClockSource::External => "external",
            ClockSource::Gps => "gps",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`ClockSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseClockSourceError(String);

impl fmt::Display for ParseClockSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown clock source: '{}'. Expected: internal, external, gps",
            self.0
        )
    }
}

impl std::error::Error for ParseClockSourceError {}

impl FromStr for ClockSource {
    type Err = ParseClockSourceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "internal" => Ok(ClockSource::Internal),
            "external" | "ext" => Ok(ClockSource::External),
            "gps" | "gpsdo" => Ok(ClockSource::Gps),
            _ => Err(ParseClockSourceError(s.to_string())),
        }
    }
}

/// An inclusive gain range in dB, as advertised by a hardware backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRange {
    /// Minimum settable gain in dB (inclusive).
    pub min_db: f64,
    /// Maximum settable gain in dB (inclusive).
    pub max_db: f64,
}

impl GainRange {
    /// Create a new gain range.
    pub fn new(min_db: f64, max_db: f64) -> Self {
        GainRange { min_db, max_db }
    }

    /// Check whether a gain value falls within this range (inclusive).
    pub fn contains(&self, gain_db: f64) -> bool {
        gain_db >= self.min_db && gain_db <= self.max_db
    }
}

impl fmt::Display for GainRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} dB", self.min_db, self.max_db)
    }
}

/// When a frame should go on the air.
///
/// Units are sample-clock ticks since the epoch the hardware defines
/// (typically device power-on or the last PPS rollover). Frames submitted
/// with [`Timestamp::Ticks`] must carry non-decreasing values; a frame whose
/// ticks precede the current playback position is counted as late and
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// Transmit as soon as the hardware can, with no timing constraint.
    Now,
    /// Transmit at an absolute sample-clock tick.
    Ticks(u64),
}

impl Timestamp {
    /// Return the absolute tick count, or `None` for [`Timestamp::Now`].
    pub fn ticks(&self) -> Option<u64> {
        match self {
            Timestamp::Now => None,
            Timestamp::Ticks(t) => Some(*t),
        }
    }

    /// Convert an absolute tick count to seconds at the given sample rate.
    ///
    /// Returns `None` for [`Timestamp::Now`] or a zero sample rate.
    pub fn as_secs(&self, sample_rate_hz: f64) -> Option<f64> {
        if sample_rate_hz <= 0.0 {
            return None;
        }
        self.ticks().map(|t| t as f64 / sample_rate_hz)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Now => write!(f, "now"),
            Timestamp::Ticks(t) => write!(f, "@{t}"),
        }
    }
}
