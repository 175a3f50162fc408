//! # iqlink -- Frame Transport for Software-Defined Radio
//!
//! `iqlink` is an asynchronous Rust library for moving timestamped complex
//! sample frames to and from SDR transmit/receive hardware. It is designed
//! for broadcast modulators and real-time receive pipelines where sample
//! clock discipline, bounded blocking, and honest fault accounting are
//! essential.
//!
//! ## Quick Start
//!
//! Add `iqlink` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! iqlink = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Build a device and transmit a frame:
//!
//! ```no_run
//! use iqlink::{Complex32, DeviceBuilder, DeviceConfig, SampleFrame, SdrDevice};
//!
//! # async fn example(driver: &dyn iqlink::HardwareDriver) -> anyhow::Result<()> {
//! let mut config = DeviceConfig::new(222_064_000.0, 2_048_000.0);
//! config.device_args = "driver=uhd,serial=1234".into();
//! config.tx_gain_db = 30.0;
//!
//! let device = DeviceBuilder::new(config).build_with_driver(driver).await?;
//!
//! let samples = vec![Complex32::new(0.0, 0.0); 4096];
//! device
//!     .transmit_frame(SampleFrame::at_ticks(&samples, 2_048_000)?)
//!     .await?;
//! println!("{}", device.run_statistics());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                          |
//! |-----------------------|--------------------------------------------------|
//! | `iqlink-core`         | Traits ([`SdrDevice`], [`Hardware`]), types, errors |
//! | `iqlink-device`       | [`StreamDevice`] engine: tuning, frame transfer, fault accounting |
//! | `iqlink-test-harness` | Scriptable [`MockHardware`](mock::MockHardware) backend |
//! | **`iqlink`**          | This facade crate -- re-exports everything       |
//!
//! [`StreamDevice`] is generic over the [`Hardware`] capability trait, so the
//! same engine drives any backend and application code can work with
//! `dyn SdrDevice` without knowing which hardware is underneath.
//!
//! ## The `SdrDevice` Trait
//!
//! The [`SdrDevice`] trait is the central abstraction:
//!
//! - **Tuning**: [`tune`](SdrDevice::tune), [`tx_frequency`](SdrDevice::tx_frequency)
//! - **Gain**: [`set_tx_gain`](SdrDevice::set_tx_gain), [`set_rx_gain`](SdrDevice::set_rx_gain)
//! - **Transfer**: [`transmit_frame`](SdrDevice::transmit_frame), [`receive_frame`](SdrDevice::receive_frame)
//! - **Clock**: [`real_time_secs`](SdrDevice::real_time_secs), [`is_clock_source_ok`](SdrDevice::is_clock_source_ok)
//! - **Telemetry**: [`run_statistics`](SdrDevice::run_statistics)
//!
//! ## Fault Model
//!
//! Transient stream events (underflow, overflow, late frames) are counted in
//! [`RunStatistics`] and never surface as errors; the stream keeps running.
//! An unrecoverable hardware fault latches the device: the failing call
//! returns [`Error::TransmitFatal`] or [`Error::ReceiveFatal`], and every
//! later operation fails fast with [`Error::DeviceFatal`] until the device
//! is rebuilt.
//!
//! ## Testing
//!
//! Enable the `mock` feature to get the scriptable mock backend in the
//! [`mock`] module, or depend on `iqlink-test-harness` directly from
//! dev-dependencies.

pub use iqlink_core::*;
pub use iqlink_device::{DeviceBuilder, StreamDevice};

/// Scriptable mock hardware backend.
///
/// Provides [`MockHardware`](mock::MockHardware) and
/// [`MockDriver`](mock::MockDriver) for deterministic tests and demos:
/// script transient write statuses, queue RX blocks, flip lock sensors,
/// and inject fatal faults without any real radio attached.
#[cfg(feature = "mock")]
pub mod mock {
    pub use iqlink_test_harness::*;
}
