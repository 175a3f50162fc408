//! Flow-control statistics: underflow/overflow/late accounting.
//!
//! Transient stream faults are counted, never raised as errors, so a live
//! broadcast loop keeps running through ordinary backpressure. The device
//! owns a [`TransferCounters`] and hands callers [`RunStatistics`] snapshots;
//! no live reference to the counters ever escapes, which rules out torn
//! reads from a telemetry poller running beside the real-time paths.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of a device's transfer counters.
///
/// All counters increase monotonically over the life of a device and reset
/// only when the device is rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Hardware TX buffer ran dry (no sample available when one was due).
    pub underflows: u64,
    /// A buffer could not accept an offered frame or received block in time.
    pub overflows: u64,
    /// Frames whose timestamp preceded the playback position; dropped.
    pub late_packets: u64,
    /// Frames actually handed to the hardware TX path.
    pub frames_transmitted: u64,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} underflows={} overflows={} late={}",
            self.frames_transmitted, self.underflows, self.overflows, self.late_packets
        )
    }
}

/// Live transfer counters, owned exclusively by a device instance.
///
/// Each counter is an independent atomic: the TX path touches the TX-side
/// counters, the RX path touches the RX-side ones, and
/// [`snapshot()`](TransferCounters::snapshot) reads each counter atomically.
/// Relaxed ordering is sufficient -- the counters carry no cross-thread
/// ordering obligations, only totals.
#[derive(Debug, Default)]
pub struct TransferCounters {
    underflows: AtomicU64,
    overflows: AtomicU64,
    late_packets: AtomicU64,
    frames_transmitted: AtomicU64,
}

impl TransferCounters {
    /// Create a fresh set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hardware TX underrun.
    pub fn record_underflow(&self) {
        self.underflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame or block that could not be accepted in time.
    pub fn record_overflow(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame dropped because its timestamp was already past.
    pub fn record_late(&self) {
        self.late_packets.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame handed to the hardware TX path.
    pub fn record_frame(&self) {
        self.frames_transmitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> RunStatistics {
        RunStatistics {
            underflows: self.underflows.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            late_packets: self.late_packets.load(Ordering::Relaxed),
            frames_transmitted: self.frames_transmitted.load(Ordering::Relaxed),
        }
    }
}
