//! `DeviceBuilder` -- fluent construction of [`StreamDevice`] instances.
//!
//! The builder validates the [`DeviceConfig`], applies it to the hardware
//! (sample rate, initial tune to `frequency + lo_offset`, both gains), and
//! creates the TX and RX streams. A build that returns `Ok` hands back a
//! device already in its tuned state.
//!
//! # Example
//!
//! ```no_run
//! use iqlink_core::{ClockSource, DeviceConfig};
//! use iqlink_device::DeviceBuilder;
//!
//! # async fn example(driver: &dyn iqlink_core::HardwareDriver) -> iqlink_core::Result<()> {
//! let mut config = DeviceConfig::new(222_064_000.0, 2_048_000.0);
//! config.device_args = "driver=uhd,serial=1234".into();
//! config.tx_gain_db = 30.0;
//! config.clock_source = ClockSource::Gps;
//!
//! let device = DeviceBuilder::new(config).build_with_driver(driver).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use iqlink_core::config::DeviceConfig;
use iqlink_core::error::{Error, Result};
use iqlink_core::hardware::{Hardware, HardwareDriver};
use iqlink_core::types::Direction;

use crate::device::StreamDevice;

/// Default bound on pure hardware reads (frequency, gain, time, sensors).
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// Fluent builder for [`StreamDevice`].
pub struct DeviceBuilder {
    config: DeviceConfig,
    query_timeout: Duration,
}

impl DeviceBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: DeviceConfig) -> Self {
        DeviceBuilder {
            config,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the bound on pure hardware reads (default: 500 ms).
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Open the hardware through a driver using the config's `device_args`,
    /// then build.
    pub async fn build_with_driver(self, driver: &dyn HardwareDriver) -> Result<StreamDevice> {
        self.config.validate()?;
        let hardware = driver.open(&self.config.device_args).await?;
        self.build_with_hardware(hardware).await
    }

    /// Build a device over an already-opened hardware handle.
    ///
    /// This is the primary entry point for testing (pass a `MockHardware`
    /// from `iqlink-test-harness`) and for callers that manage hardware
    /// lifetime themselves.
    pub async fn build_with_hardware(self, hardware: Arc<dyn Hardware>) -> Result<StreamDevice> {
        self.config.validate()?;

        let name = hardware.name().to_string();
        debug!(device = %name, "applying device configuration");

        hardware
            .set_sample_rate(self.config.sample_rate_hz)
            .await
            .map_err(|e| {
                Error::Config(format!(
                    "{name} rejected sample rate {} Hz: {e}",
                    self.config.sample_rate_hz
                ))
            })?;

        let center_hz = self.config.center_frequency_hz();
        for direction in [Direction::Tx, Direction::Rx] {
            hardware
                .set_frequency(direction, center_hz)
                .await
                .map_err(|e| Error::Tune(format!("{center_hz} Hz on {name} {direction}: {e}")))?;
        }

        for (direction, gain_db) in [
            (Direction::Tx, self.config.tx_gain_db),
            (Direction::Rx, self.config.rx_gain_db),
        ] {
            let range = hardware.gain_range(direction);
            if !range.contains(gain_db) {
                return Err(Error::GainOutOfRange {
                    requested_db: gain_db,
                    range,
                });
            }
            hardware.set_gain(direction, gain_db).await?;
        }

        let tx_stream = hardware.create_tx_stream().await?;
        let rx_stream = hardware.create_rx_stream().await?;
        debug!(device = %name, center_hz, "device tuned and streams ready");

        Ok(StreamDevice::new(
            hardware,
            self.config,
            tx_stream,
            rx_stream,
            self.query_timeout,
        ))
    }
}
