//! Hardware capability traits for SDR backends.
//!
//! The [`Hardware`] trait abstracts over the physical radio: frequency and
//! gain setters, stream creation, sensor queries, and the sample clock. The
//! frame-transport engine (`iqlink-device`) operates on a `Hardware` rather
//! than on any vendor API, enabling both real hardware backends and
//! deterministic unit testing with `MockHardware` from the
//! `iqlink-test-harness` crate.
//!
//! A backend reports *transient* stream conditions as [`WriteStatus`] /
//! [`ReadStatus`] values. An `Err(_)` from a stream method means the fault
//! is unrecoverable and the device holding the stream goes fatal.

use async_trait::async_trait;
use num_complex::Complex32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::types::{Direction, GainRange, Timestamp};

/// A value read from a hardware sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    /// A boolean sensor (e.g. a lock indicator).
    Bool(bool),
    /// A numeric sensor (e.g. a temperature).
    Float(f64),
    /// A free-form text sensor (e.g. a GPS fix description).
    Text(String),
}

impl SensorValue {
    /// Interpret the sensor value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SensorValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Outcome of handing one frame to the hardware TX queue.
///
/// Every variant except an `Err(_)` from
/// [`TxStream::write`] leaves the stream usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// All samples were queued for transmission.
    Accepted,
    /// Samples were queued, but the hardware reports its TX buffer ran dry
    /// since the previous write.
    Underflow,
    /// The frame's timestamp was already past when it reached the hardware;
    /// the hardware discarded it.
    TimeError,
    /// The hardware queue could not accept the frame within its bounded
    /// wait; the frame was not queued.
    Timeout,
}

/// Outcome of one hardware read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Samples were delivered normally.
    Ok,
    /// The hardware dropped samples because its RX buffer overran.
    Overflow,
    /// The timeout expired; `count` may be zero or short.
    Timeout,
}

/// What one [`RxStream::read`] call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResult {
    /// Number of samples written into the caller's buffer.
    pub count: usize,
    /// Sample-clock tick of the first returned sample. Meaningless when
    /// `count` is zero.
    pub timestamp: u64,
    /// How the read ended.
    pub status: ReadStatus,
}

/// Opens hardware by device-selection string.
///
/// Backends register a driver; the device builder resolves the configured
/// `device_args` through it. This is the only place a selection string is
/// interpreted.
#[async_trait]
pub trait HardwareDriver: Send + Sync {
    /// Open the device selected by `device_args`.
    ///
    /// An empty string selects the backend's default device.
    async fn open(&self, device_args: &str) -> Result<Arc<dyn Hardware>>;
}

/// An opened radio: tuning, gain, streams, sensors, and the sample clock.
///
/// Implementations must be safe to share between the TX and RX paths
/// (`Send + Sync`); the two streams a device creates are logically
/// independent resources. Control methods (`set_frequency`, `set_gain`)
/// may briefly interrupt streaming but must leave the hardware consistent.
#[async_trait]
pub trait Hardware: Send + Sync {
    /// Stable human-readable identifier for diagnostics.
    fn name(&self) -> &str;

    /// The settable gain range for one direction.
    fn gain_range(&self, direction: Direction) -> GainRange;

    /// Set the sample rate for both streams, in Hz.
    async fn set_sample_rate(&self, rate_hz: f64) -> Result<()>;

    /// Set the center frequency of one path, in Hz.
    ///
    /// Fails if the frequency is outside the hardware's RF range; the
    /// hardware is the authority on its own limits.
    async fn set_frequency(&self, direction: Direction, freq_hz: f64) -> Result<()>;

    /// Read back the current center frequency of one path, in Hz.
    async fn frequency(&self, direction: Direction) -> Result<f64>;

    /// Set the gain of one path, in dB.
    async fn set_gain(&self, direction: Direction, gain_db: f64) -> Result<()>;

    /// Read back the current gain of one path, in dB.
    async fn gain(&self, direction: Direction) -> Result<f64>;

    /// Create the transmit stream.
    async fn create_tx_stream(&self) -> Result<Box<dyn TxStream>>;

    /// Create the receive stream.
    async fn create_rx_stream(&self) -> Result<Box<dyn RxStream>>;

    /// Query a named sensor (e.g. `"ref_locked"`, `"gps_locked"`).
    ///
    /// Returns [`Error::Unsupported`](crate::error::Error::Unsupported) if
    /// the hardware has no such sensor. The value reflects the sensor *now*;
    /// backends must not cache lock state.
    async fn query_sensor(&self, name: &str) -> Result<SensorValue>;

    /// Current hardware time in sample-clock ticks since the device epoch.
    async fn time_ticks(&self) -> Result<u64>;
}

/// The hardware transmit queue.
///
/// `write` must return within a short, bounded hardware-queuing delay; a
/// queue that stays full reports [`WriteStatus::Timeout`] rather than
/// blocking the producer.
#[async_trait]
pub trait TxStream: Send + Sync {
    /// Queue one buffer of samples for transmission at `timestamp`.
    async fn write(&mut self, samples: &[Complex32], timestamp: Timestamp) -> Result<WriteStatus>;
}

/// The hardware receive queue.
#[async_trait]
pub trait RxStream: Send + Sync {
    /// Fill `buf` with up to `buf.len()` samples, waiting at most `timeout`.
    ///
    /// A zero `timeout` polls: whatever is immediately available is
    /// returned, possibly nothing.
    async fn read(&mut self, buf: &mut [Complex32], timeout: Duration) -> Result<ReadResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_value_as_bool() {
        assert_eq!(SensorValue::Bool(true).as_bool(), Some(true));
        assert_eq!(SensorValue::Bool(false).as_bool(), Some(false));
        assert_eq!(SensorValue::Float(1.0).as_bool(), None);
        assert_eq!(SensorValue::Text("locked".into()).as_bool(), None);
    }

    #[test]
    fn traits_are_object_safe() {
        fn assert_obj<T: ?Sized>() {}
        assert_obj::<dyn Hardware>();
        assert_obj::<dyn HardwareDriver>();
        assert_obj::<dyn TxStream>();
        assert_obj::<dyn RxStream>();
    }
}
