//! iqlink-test-harness: mock hardware backend for deterministic testing.
//!
//! This crate provides [`MockHardware`] / [`MockDriver`] implementing the
//! [`Hardware`](iqlink_core::hardware::Hardware) capability without any real
//! radio. Tests script transient TX statuses, queue RX sample blocks, flip
//! lock sensors, advance the sample clock, and inject unrecoverable faults,
//! then assert on what the device layer did with them.

pub mod mock_hardware;

pub use mock_hardware::{MockDriver, MockHardware, TxRecord};
