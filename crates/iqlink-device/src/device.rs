//! `StreamDevice` -- the [`SdrDevice`] implementation over any [`Hardware`].
//!
//! This module ties a hardware backend to the frame-transport contract:
//! tuning with LO offset, gain range enforcement, timestamped TX with
//! late/overflow/underflow accounting, timeout-bounded RX, and the fatal
//! latch that keeps a faulted device from touching hardware again.
//!
//! The TX and RX paths hold independent locks, so a producer task and a
//! consumer task never contend on the hot path. All transient stream
//! conditions are counted, never raised; only unrecoverable hardware faults
//! error out.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use num_complex::Complex32;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use iqlink_core::config::DeviceConfig;
use iqlink_core::device::SdrDevice;
use iqlink_core::error::{Error, Result};
use iqlink_core::frame::{RxFrame, SampleFrame};
use iqlink_core::hardware::{Hardware, ReadStatus, RxStream, TxStream, WriteStatus};
use iqlink_core::stats::{RunStatistics, TransferCounters};
use iqlink_core::types::{Direction, Timestamp};

use crate::clock;

/// Lifecycle state of a device.
///
/// `Tuned` and `Streaming` differ only in whether a transfer call has run
/// yet; `Fatal` is terminal and latches every subsequent call out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum DeviceState {
    Tuned = 0,
    Streaming = 1,
    Fatal = 2,
}

impl DeviceState {
    fn from_u8(v: u8) -> DeviceState {
        match v {
            0 => DeviceState::Tuned,
            1 => DeviceState::Streaming,
            _ => DeviceState::Fatal,
        }
    }
}

/// The TX side: the hardware stream plus the playback cursor used for
/// device-side late detection.
struct TxPath {
    stream: Box<dyn TxStream>,
    /// First tick the next in-order frame may carry: one past the end of
    /// the last timestamped frame handed to hardware.
    position_ticks: u64,
}

/// A tuned SDR device driving one hardware backend.
///
/// Constructed via [`DeviceBuilder`](crate::builder::DeviceBuilder), which
/// applies the full [`DeviceConfig`] (sample rate, initial tune, gains)
/// before handing the device out -- a `StreamDevice` you hold is already
/// tuned and ready for transfer calls.
///
/// Dropping the device drops both streams and then the hardware handle,
/// from any state including fatal.
pub struct StreamDevice {
    hardware: Arc<dyn Hardware>,
    name: String,
    config: RwLock<DeviceConfig>,
    state: AtomicU8,
    counters: TransferCounters,
    tx: Mutex<TxPath>,
    rx: Mutex<Box<dyn RxStream>>,
    query_timeout: Duration,
}

impl StreamDevice {
    /// Assemble a device from parts the builder prepared.
    ///
    /// Called by [`DeviceBuilder`](crate::builder::DeviceBuilder) after the
    /// config has been validated and applied to the hardware.
    pub(crate) fn new(
        hardware: Arc<dyn Hardware>,
        config: DeviceConfig,
        tx_stream: Box<dyn TxStream>,
        rx_stream: Box<dyn RxStream>,
        query_timeout: Duration,
    ) -> Self {
        let name = hardware.name().to_string();
        StreamDevice {
            hardware,
            name,
            config: RwLock::new(config),
            state: AtomicU8::new(DeviceState::Tuned as u8),
            counters: TransferCounters::new(),
            tx: Mutex::new(TxPath {
                stream: tx_stream,
                position_ticks: 0,
            }),
            rx: Mutex::new(rx_stream),
            query_timeout,
        }
    }

    fn state(&self) -> DeviceState {
        DeviceState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Reject the call if the device has latched fatal.
    fn ensure_live(&self) -> Result<()> {
        if self.state() == DeviceState::Fatal {
            return Err(Error::DeviceFatal {
                device: self.name.clone(),
            });
        }
        Ok(())
    }

    /// First transfer call moves Tuned -> Streaming.
    fn mark_streaming(&self) {
        let _ = self.state.compare_exchange(
            DeviceState::Tuned as u8,
            DeviceState::Streaming as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn mark_fatal(&self) {
        self.state.store(DeviceState::Fatal as u8, Ordering::Release);
    }

    fn config_read(&self) -> RwLockReadGuard<'_, DeviceConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn config_write(&self) -> RwLockWriteGuard<'_, DeviceConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a pure hardware read with the bounded query timeout.
    async fn bounded<T>(
        &self,
        query: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Check a gain against the advertised range for one direction.
    fn check_gain(&self, direction: Direction, gain_db: f64) -> Result<()> {
        if !gain_db.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "{direction} gain must be finite, got {gain_db} dB"
            )));
        }
        let range = self.hardware.gain_range(direction);
        if !range.contains(gain_db) {
            return Err(Error::GainOutOfRange {
                requested_db: gain_db,
                range,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SdrDevice for StreamDevice {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> DeviceConfig {
        self.config_read().clone()
    }

    fn run_statistics(&self) -> RunStatistics {
        self.counters.snapshot()
    }

    async fn tune(&self, lo_offset_hz: f64, frequency_hz: f64) -> Result<()> {
        self.ensure_live()?;
        if !frequency_hz.is_finite() || !lo_offset_hz.is_finite() {
            return Err(Error::InvalidParameter(
                "tune frequency and LO offset must be finite".into(),
            ));
        }
        if frequency_hz <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "tune frequency must be positive, got {frequency_hz} Hz"
            )));
        }

        let center_hz = frequency_hz + lo_offset_hz;
        if center_hz <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "hardware center frequency must be positive, got {center_hz} Hz"
            )));
        }
        let previous_hz = self.config_read().center_frequency_hz();
        debug!(device = %self.name, center_hz, "tuning");

        self.hardware
            .set_frequency(Direction::Tx, center_hz)
            .await
            .map_err(|e| Error::Tune(format!("{center_hz} Hz on {}: {e}", self.name)))?;

        if let Err(e) = self.hardware.set_frequency(Direction::Rx, center_hz).await {
            // Roll the TX side back so a failed tune leaves the previous
            // tuning in place.
            if let Err(restore) = self
                .hardware
                .set_frequency(Direction::Tx, previous_hz)
                .await
            {
                warn!(device = %self.name, previous_hz, error = %restore,
                      "failed to restore TX frequency after RX tune failure");
            }
            return Err(Error::Tune(format!(
                "{center_hz} Hz on {} RX path: {e}",
                self.name
            )));
        }

        let mut config = self.config_write();
        config.frequency_hz = frequency_hz;
        config.lo_offset_hz = lo_offset_hz;
        Ok(())
    }

    async fn tx_frequency(&self) -> Result<f64> {
        self.ensure_live()?;
        self.bounded(self.hardware.frequency(Direction::Tx)).await
    }

    async fn set_tx_gain(&self, gain_db: f64) -> Result<()> {
        self.ensure_live()?;
        self.check_gain(Direction::Tx, gain_db)?;
        debug!(device = %self.name, gain_db, "setting TX gain");
        self.hardware.set_gain(Direction::Tx, gain_db).await?;
        self.config_write().tx_gain_db = gain_db;
        Ok(())
    }

    async fn tx_gain(&self) -> Result<f64> {
        self.ensure_live()?;
        self.bounded(self.hardware.gain(Direction::Tx)).await
    }

    async fn set_rx_gain(&self, gain_db: f64) -> Result<()> {
        self.ensure_live()?;
        self.check_gain(Direction::Rx, gain_db)?;
        debug!(device = %self.name, gain_db, "setting RX gain");
        self.hardware.set_gain(Direction::Rx, gain_db).await?;
        self.config_write().rx_gain_db = gain_db;
        Ok(())
    }

    async fn rx_gain(&self) -> Result<f64> {
        self.ensure_live()?;
        self.bounded(self.hardware.gain(Direction::Rx)).await
    }

    async fn transmit_frame(&self, frame: SampleFrame<'_>) -> Result<()> {
        self.ensure_live()?;
        self.mark_streaming();

        let mut tx = self.tx.lock().await;

        // Device-side late detection: a timestamp behind the playback
        // cursor is dropped here, before it wastes a hardware round-trip.
        if let Some(ticks) = frame.timestamp().ticks() {
            if ticks < tx.position_ticks {
                self.counters.record_late();
                debug!(device = %self.name, ticks, position = tx.position_ticks,
                       "dropping late frame");
                return Ok(());
            }
        }

        match tx.stream.write(frame.samples(), frame.timestamp()).await {
            Ok(WriteStatus::Accepted) => {
                self.counters.record_frame();
                if let Some(end) = frame.end_ticks() {
                    tx.position_ticks = end;
                }
                Ok(())
            }
            Ok(WriteStatus::Underflow) => {
                // The frame went out, but the hardware starved beforehand.
                self.counters.record_underflow();
                self.counters.record_frame();
                if let Some(end) = frame.end_ticks() {
                    tx.position_ticks = end;
                }
                debug!(device = %self.name, "hardware reported TX underflow");
                Ok(())
            }
            Ok(WriteStatus::TimeError) => {
                // Hardware saw the timestamp as already past and dropped it.
                self.counters.record_late();
                debug!(device = %self.name, "hardware dropped late frame");
                Ok(())
            }
            Ok(WriteStatus::Timeout) => {
                // Queue full beyond the bounded wait: software overflow,
                // frame dropped, stream continues.
                self.counters.record_overflow();
                debug!(device = %self.name, "TX queue full, frame dropped");
                Ok(())
            }
            Err(e) => {
                self.mark_fatal();
                warn!(device = %self.name, error = %e, "fatal TX fault");
                Err(Error::TransmitFatal {
                    device: self.name.clone(),
                    detail: e.to_string(),
                })
            }
        }
    }

    async fn receive_frame(&self, buf: &mut [Complex32], timeout: Duration) -> Result<RxFrame> {
        self.ensure_live()?;
        if buf.is_empty() {
            return Err(Error::InvalidParameter(
                "receive buffer must hold at least one sample".into(),
            ));
        }
        self.mark_streaming();

        let mut rx = self.rx.lock().await;
        match rx.read(buf, timeout).await {
            Ok(result) => {
                if result.status == ReadStatus::Overflow {
                    self.counters.record_overflow();
                    debug!(device = %self.name, "hardware reported RX overflow");
                }
                Ok(RxFrame {
                    count: result.count,
                    timestamp: (result.count > 0).then_some(result.timestamp),
                })
            }
            Err(e) => {
                self.mark_fatal();
                warn!(device = %self.name, error = %e, "fatal RX fault");
                Err(Error::ReceiveFatal {
                    device: self.name.clone(),
                    detail: e.to_string(),
                })
            }
        }
    }

    async fn real_time_secs(&self) -> Result<f64> {
        self.ensure_live()?;
        let ticks = self.bounded(self.hardware.time_ticks()).await?;
        let sample_rate_hz = self.config_read().sample_rate_hz;
        Ok(ticks as f64 / sample_rate_hz)
    }

    async fn is_clock_source_ok(&self) -> Result<bool> {
        self.ensure_live()?;
        let source = self.config_read().clock_source;
        self.bounded(clock::clock_source_ok(self.hardware.as_ref(), source))
            .await
    }
}
