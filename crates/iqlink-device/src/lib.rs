//! iqlink-device: the generic frame-transport engine.
//!
//! [`StreamDevice`] implements the
//! [`SdrDevice`](iqlink_core::device::SdrDevice) contract over any
//! [`Hardware`](iqlink_core::hardware::Hardware) backend: LO-offset-aware
//! tuning, gain range enforcement, timestamped frame transmit with
//! late/overflow/underflow accounting, timeout-bounded receive, clock
//! discipline checks, and a fatal latch for unrecoverable hardware faults.
//!
//! Construct devices with [`DeviceBuilder`]; the builder applies the full
//! configuration before handing the device out.

pub mod builder;
pub mod clock;
pub mod device;

pub use builder::DeviceBuilder;
pub use device::StreamDevice;
