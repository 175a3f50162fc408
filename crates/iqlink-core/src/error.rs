//! Error types for iqlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Configuration, tuning, gain, and
//! hardware I/O failures are all captured here.
//!
//! Transient stream conditions (underflow, overflow, late frame) are *not*
//! errors: they are accounted in [`RunStatistics`](crate::stats::RunStatistics)
//! so a live transmit loop is never interrupted by ordinary backpressure.

use crate::types::GainRange;

/// The error type for all iqlink operations.
///
/// Variants cover the failure modes of a device-facing SDR I/O layer:
/// invalid setup, rejected retunes, out-of-range gain requests, and
/// unrecoverable hardware faults. A device that has reported a fatal
/// transmit or receive fault rejects every later call with
/// [`Error::DeviceFatal`] until it is rebuilt.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid frequency, gain, or sample rate at setup time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The hardware rejected a retune request.
    #[error("tune rejected: {0}")]
    Tune(String),

    /// A requested gain is outside the hardware-advertised range.
    ///
    /// iqlink never clamps silently; the caller is told the supported range.
    #[error("gain {requested_db} dB outside supported range {range}")]
    GainOutOfRange {
        /// The gain that was requested, in dB.
        requested_db: f64,
        /// The range the hardware advertises.
        range: GainRange,
    },

    /// Unrecoverable hardware failure on the transmit path.
    ///
    /// The device transitions to its fatal state; only reconstruction
    /// recovers. Ordinary TX backpressure never produces this error.
    #[error("transmit failed on {device}: {detail}")]
    TransmitFatal {
        /// Name of the device that faulted.
        device: String,
        /// Backend-reported failure detail.
        detail: String,
    },

    /// Unrecoverable hardware failure on the receive path.
    ///
    /// A receive timeout is *not* this error; timeouts return a zero-length
    /// read.
    #[error("receive failed on {device}: {detail}")]
    ReceiveFatal {
        /// Name of the device that faulted.
        device: String,
        /// Backend-reported failure detail.
        detail: String,
    },

    /// The device previously hit a fatal fault; all calls are rejected.
    #[error("device {device} is in a fatal state; rebuild it to recover")]
    DeviceFatal {
        /// Name of the device.
        device: String,
    },

    /// An invalid parameter was passed to a device operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation is not supported by this hardware backend.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A bounded hardware query did not complete in time.
    #[error("timeout waiting for hardware")]
    Timeout,

    /// A backend-specific hardware error outside the categories above.
    #[error("hardware error: {0}")]
    Hardware(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
