//! The `SdrDevice` trait -- uniform contract for SDR frame transport.
//!
//! This trait is the primary API surface of iqlink. Modulator pipelines,
//! capture tools, and telemetry reporters program against `dyn SdrDevice`
//! without needing to know which hardware backend is underneath.
//!
//! The generic engine in `iqlink-device` implements this trait over any
//! [`Hardware`](crate::hardware::Hardware) backend.

use async_trait::async_trait;
use num_complex::Complex32;
use std::time::Duration;

use crate::config::DeviceConfig;
use crate::error::Result;
use crate::frame::{RxFrame, SampleFrame};
use crate::stats::RunStatistics;

/// Uniform asynchronous interface to one SDR transmitter/receiver.
///
/// # Real-time discipline
///
/// [`transmit_frame()`](SdrDevice::transmit_frame) and
/// [`receive_frame()`](SdrDevice::receive_frame) are independent paths: a
/// producer task can drive TX at frame cadence while a consumer task drives
/// RX, with no shared lock between them. Transient stream faults (underflow,
/// overflow, late frame) never surface as errors on these paths -- they are
/// accounted in [`run_statistics()`](SdrDevice::run_statistics) and the
/// stream continues, preserving on-air continuity.
///
/// # Fatal faults
///
/// An unrecoverable hardware fault fails the offending call with
/// `TransmitFatal` / `ReceiveFatal` and latches the device; every later call
/// fails immediately with `DeviceFatal`. The device never retries
/// internally: whether and when to rebuild is the caller's policy.
#[async_trait]
pub trait SdrDevice: Send + Sync {
    /// Stable human-readable identifier for diagnostics and logs.
    fn device_name(&self) -> &str;

    /// A snapshot of the device's current configuration.
    ///
    /// Reflects all explicit setter calls made so far; the device never
    /// mutates its configuration on its own.
    fn config(&self) -> DeviceConfig;

    /// A snapshot of the flow-control counters at this instant.
    ///
    /// Cheap and non-blocking; safe to poll from a telemetry task while
    /// both transfer paths are running.
    fn run_statistics(&self) -> RunStatistics;

    /// Retune: set the hardware center frequency to
    /// `frequency_hz + lo_offset_hz`.
    ///
    /// May briefly interrupt streaming. On success the device is
    /// consistently tuned to the new frequency; on failure
    /// ([`Error::Tune`](crate::error::Error::Tune)) the previous tuning and
    /// configuration are unchanged.
    async fn tune(&self, lo_offset_hz: f64, frequency_hz: f64) -> Result<()>;

    /// Read the current hardware TX center frequency in Hz.
    ///
    /// Bounded by the device's hardware-query timeout.
    async fn tx_frequency(&self) -> Result<f64>;

    /// Set the TX gain in dB, applied immediately.
    ///
    /// Fails with [`Error::GainOutOfRange`](crate::error::Error::GainOutOfRange)
    /// when outside the hardware-advertised range; gains are never silently
    /// clamped.
    async fn set_tx_gain(&self, gain_db: f64) -> Result<()>;

    /// Read the current hardware TX gain in dB.
    async fn tx_gain(&self) -> Result<f64>;

    /// Set the RX gain in dB, applied immediately.
    ///
    /// Same range policy as [`set_tx_gain()`](SdrDevice::set_tx_gain).
    async fn set_rx_gain(&self, gain_db: f64) -> Result<()>;

    /// Read the current hardware RX gain in dB.
    async fn rx_gain(&self) -> Result<f64>;

    /// Queue one frame on the hardware TX path.
    ///
    /// Never blocks beyond the hardware's short bounded queuing delay, and
    /// never fails for ordinary backpressure:
    ///
    /// - a frame the queue cannot accept in time counts as an overflow and
    ///   is dropped;
    /// - a frame whose timestamp is already past counts as a late packet
    ///   and is dropped (never coerced to "now");
    /// - a hardware-reported TX underrun counts as an underflow.
    ///
    /// Only an unrecoverable hardware fault returns an error
    /// (`TransmitFatal`, then `DeviceFatal` on subsequent calls).
    async fn transmit_frame(&self, frame: SampleFrame<'_>) -> Result<()>;

    /// Fill `buf` with up to `buf.len()` received samples, waiting at most
    /// `timeout`.
    ///
    /// Returns how many samples landed and the hardware timestamp of the
    /// first one. A count of zero after the timeout is a normal outcome,
    /// not an error; only unrecoverable hardware faults fail
    /// (`ReceiveFatal`).
    async fn receive_frame(&self, buf: &mut [Complex32], timeout: Duration) -> Result<RxFrame>;

    /// Current hardware time converted to seconds.
    ///
    /// Derived from the sample clock and the configured sample rate;
    /// monotonic for a fixed tuning/rate configuration.
    async fn real_time_secs(&self) -> Result<f64>;

    /// Whether the configured reference clock is usable right now.
    ///
    /// `true` for the internal clock source unconditionally; for external
    /// and GPS sources this polls the hardware lock sensors on every call
    /// (no caching), so a reference that drops lock is visible immediately.
    async fn is_clock_source_ok(&self) -> Result<bool>;
}
