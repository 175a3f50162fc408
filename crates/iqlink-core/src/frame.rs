//! Sample frames -- the unit of transfer between the pipeline and the device.
//!
//! A [`SampleFrame`] borrows the caller's I/Q buffer for the duration of a
//! [`transmit_frame()`](crate::device::SdrDevice::transmit_frame) call; no
//! buffer ever changes ownership across the device boundary. On receive, the
//! device fills caller-supplied storage and returns an [`RxFrame`] describing
//! what landed in it.
//!
//! Samples are `num_complex::Complex32` I/Q pairs. What full scale means is
//! up to the hardware backend; the transport layer never rescales.

use num_complex::Complex32;

use crate::error::{Error, Result};
use crate::types::Timestamp;

/// One frame of complex baseband samples to transmit, with its timing.
///
/// The frame borrows the caller's buffer; the device reads it during the
/// transmit call and nothing more. Frames are non-empty by construction.
#[derive(Debug, Clone, Copy)]
pub struct SampleFrame<'a> {
    samples: &'a [Complex32],
    timestamp: Timestamp,
}

impl<'a> SampleFrame<'a> {
    /// Create a frame from a sample buffer and a timestamp.
    ///
    /// Returns [`Error::InvalidParameter`] for an empty buffer -- a frame
    /// must carry at least one sample.
    pub fn new(samples: &'a [Complex32], timestamp: Timestamp) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidParameter(
                "sample frame must contain at least one sample".into(),
            ));
        }
        Ok(SampleFrame { samples, timestamp })
    }

    /// Create a frame to be transmitted as soon as possible.
    pub fn now(samples: &'a [Complex32]) -> Result<Self> {
        Self::new(samples, Timestamp::Now)
    }

    /// Create a frame scheduled at an absolute sample-clock tick.
    pub fn at_ticks(samples: &'a [Complex32], ticks: u64) -> Result<Self> {
        Self::new(samples, Timestamp::Ticks(ticks))
    }

    /// The I/Q samples of this frame.
    pub fn samples(&self) -> &'a [Complex32] {
        self.samples
    }

    /// When this frame should go on the air.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Number of complex samples in this frame.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; kept for API symmetry with slice types.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The first sample-clock tick *after* this frame, if it is timestamped.
    ///
    /// This is the earliest tick the next in-order frame may carry.
    pub fn end_ticks(&self) -> Option<u64> {
        self.timestamp
            .ticks()
            .map(|t| t.saturating_add(self.samples.len() as u64))
    }

    /// Duration of this frame in seconds at the given sample rate.
    pub fn duration_secs(&self, sample_rate_hz: f64) -> f64 {
        if sample_rate_hz <= 0.0 {
            return 0.0;
        }
        self.samples.len() as f64 / sample_rate_hz
    }
}

/// Result of one [`receive_frame()`](crate::device::SdrDevice::receive_frame)
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxFrame {
    /// Number of samples written to the caller's buffer. May be less than
    /// requested; zero means the timeout expired with nothing available,
    /// which is not an error.
    pub count: usize,
    /// Hardware timestamp (sample-clock ticks) of the first returned sample.
    /// `None` when `count` is zero.
    pub timestamp: Option<u64>,
}

impl RxFrame {
    /// An empty read: the timeout expired before any samples arrived.
    pub fn empty() -> Self {
        RxFrame {
            count: 0,
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iq(n: usize) -> Vec<Complex32> {
        (0..n).map(|i| Complex32::new(i as f32, -(i as f32))).collect()
    }

    #[test]
    fn frame_construction() {
        let samples = iq(4);
        let frame = SampleFrame::at_ticks(&samples, 1000).unwrap();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.timestamp(), Timestamp::Ticks(1000));
        assert_eq!(frame.samples()[2], Complex32::new(2.0, -2.0));
    }

    #[test]
    fn empty_frame_rejected() {
        let samples: Vec<Complex32> = Vec::new();
        let result = SampleFrame::now(&samples);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn now_frame_has_no_ticks() {
        let samples = iq(8);
        let frame = SampleFrame::now(&samples).unwrap();
        assert_eq!(frame.timestamp(), Timestamp::Now);
        assert_eq!(frame.end_ticks(), None);
    }

    #[test]
    fn end_ticks_is_start_plus_length() {
        let samples = iq(256);
        let frame = SampleFrame::at_ticks(&samples, 10_000).unwrap();
        assert_eq!(frame.end_ticks(), Some(10_256));
    }

    #[test]
    fn end_ticks_saturates() {
        let samples = iq(16);
        let frame = SampleFrame::at_ticks(&samples, u64::MAX - 4).unwrap();
        assert_eq!(frame.end_ticks(), Some(u64::MAX));
    }

    #[test]
    fn duration_secs() {
        let samples = iq(2048);
        let frame = SampleFrame::now(&samples).unwrap();
        assert!((frame.duration_secs(2_048_000.0) - 0.001).abs() < 1e-9);
        assert_eq!(frame.duration_secs(0.0), 0.0);
    }

    #[test]
    fn rx_frame_empty() {
        let rx = RxFrame::empty();
        assert_eq!(rx.count, 0);
        assert_eq!(rx.timestamp, None);
    }
}
