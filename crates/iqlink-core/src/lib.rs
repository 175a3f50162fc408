//! iqlink-core: Core traits, types, and error definitions for iqlink.
//!
//! This crate defines the hardware-agnostic abstractions of the iqlink frame
//! transport layer. Pipelines and telemetry consumers depend on these types
//! without pulling in any specific hardware backend.
//!
//! # Key types
//!
//! - [`SdrDevice`] -- the uniform trait for tuning, gain, and frame transfer
//! - [`Hardware`] -- the capability a radio backend must provide
//! - [`SampleFrame`] / [`RxFrame`] -- the unit of transfer
//! - [`DeviceConfig`] -- validated device configuration
//! - [`RunStatistics`] -- underflow/overflow/late accounting
//! - [`Error`] / [`Result`] -- error handling

pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod hardware;
pub mod stats;
pub mod types;

// Re-export key types at crate root for ergonomic `use iqlink_core::*`.
pub use config::DeviceConfig;
pub use device::SdrDevice;
pub use error::{Error, Result};
pub use frame::{RxFrame, SampleFrame};
pub use hardware::{
    Hardware, HardwareDriver, ReadResult, ReadStatus, RxStream, SensorValue, TxStream, WriteStatus,
};
pub use stats::{RunStatistics, TransferCounters};
pub use types::{ClockSource, Direction, GainRange, Timestamp};

// The sample type at the API boundary; re-exported so consumers don't need
// a separate num-complex dependency just to build frames.
pub use num_complex::Complex32;
