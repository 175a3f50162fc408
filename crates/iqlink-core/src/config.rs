//! Device configuration.
//!
//! [`DeviceConfig`] is assembled by the caller before a device is built and
//! validated once at build time. After construction the device owns the
//! config; it changes only through explicit setter calls
//! ([`tune()`](crate::device::SdrDevice::tune),
//! [`set_tx_gain()`](crate::device::SdrDevice::set_tx_gain),
//! [`set_rx_gain()`](crate::device::SdrDevice::set_rx_gain)), never behind
//! the caller's back.

use crate::error::{Error, Result};
use crate::types::ClockSource;

/// Validated configuration for an SDR device.
///
/// The hardware center frequency is `frequency_hz + lo_offset_hz`; the LO
/// offset moves the oscillator's spur away from the signal of interest
/// without changing the target frequency the caller reasons about.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Backend-specific device selection string (e.g. `"driver=mock"`).
    /// Empty selects the backend's default device.
    pub device_args: String,
    /// Target RF frequency in Hz.
    pub frequency_hz: f64,
    /// Local-oscillator offset in Hz, added to `frequency_hz` when tuning.
    pub lo_offset_hz: f64,
    /// Transmit gain in dB.
    pub tx_gain_db: f64,
    /// Receive gain in dB.
    pub rx_gain_db: f64,
    /// Sample rate in Hz for both streams.
    pub sample_rate_hz: f64,
    /// Reference clock source the device should discipline to.
    pub clock_source: ClockSource,
}

impl DeviceConfig {
    /// Create a config for the given target frequency and sample rate, with
    /// zero LO offset, zero gains, and the internal clock.
    pub fn new(frequency_hz: f64, sample_rate_hz: f64) -> Self {
        DeviceConfig {
            device_args: String::new(),
            frequency_hz,
            lo_offset_hz: 0.0,
            tx_gain_db: 0.0,
            rx_gain_db: 0.0,
            sample_rate_hz,
            clock_source: ClockSource::Internal,
        }
    }

    /// The hardware center frequency: `frequency_hz + lo_offset_hz`.
    pub fn center_frequency_hz(&self) -> f64 {
        self.frequency_hz + self.lo_offset_hz
    }

    /// Validate the configuration.
    ///
    /// Returns [`Error::Config`] describing the first problem found. Called
    /// by the device builder before any hardware is touched.
    pub fn validate(&self) -> Result<()> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(Error::Config(format!(
                "frequency must be positive and finite, got {} Hz",
                self.frequency_hz
            )));
        }
        if !self.lo_offset_hz.is_finite() {
            return Err(Error::Config(format!(
                "LO offset must be finite, got {} Hz",
                self.lo_offset_hz
            )));
        }
        if self.center_frequency_hz() <= 0.0 {
            return Err(Error::Config(format!(
                "center frequency (frequency + LO offset) must be positive, got {} Hz",
                self.center_frequency_hz()
            )));
        }
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(Error::Config(format!(
                "sample rate must be positive and finite, got {} Hz",
                self.sample_rate_hz
            )));
        }
        if !self.tx_gain_db.is_finite() {
            return Err(Error::Config(format!(
                "TX gain must be finite, got {} dB",
                self.tx_gain_db
            )));
        }
        if !self.rx_gain_db.is_finite() {
            return Err(Error::Config(format!(
                "RX gain must be finite, got {} dB",
                self.rx_gain_db
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DeviceConfig {
        DeviceConfig {
            device_args: "driver=mock".into(),
            frequency_hz: 222_064_000.0,
            lo_offset_hz: -100_000.0,
            tx_gain_db: 30.0,
            rx_gain_db: 15.0,
            sample_rate_hz: 2_048_000.0,
            clock_source: ClockSource::Gps,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn new_defaults() {
        let config = DeviceConfig::new(145_000_000.0, 2_048_000.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.clock_source, ClockSource::Internal);
        assert_eq!(config.lo_offset_hz, 0.0);
        assert!(config.device_args.is_empty());
    }

    #[test]
    fn center_frequency_includes_lo_offset() {
        let config = valid_config();
        assert_eq!(config.center_frequency_hz(), 221_964_000.0);
    }

    #[test]
    fn rejects_zero_frequency() {
        let mut config = valid_config();
        config.frequency_hz = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_nan_frequency() {
        let mut config = valid_config();
        config.frequency_hz = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_negative_sample_rate() {
        let mut config = valid_config();
        config.sample_rate_hz = -1.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_infinite_gain() {
        let mut config = valid_config();
        config.tx_gain_db = f64::INFINITY;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_lo_offset_that_pushes_center_negative() {
        let mut config = valid_config();
        config.lo_offset_hz = -300_000_000.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
