//! Mock hardware for deterministic testing of the frame-transport layer.
//!
//! [`MockHardware`] implements the [`Hardware`] capability with scriptable
//! behavior. Keep a clone of the `Arc` you hand to the device builder and
//! drive the script from the test while the device runs:
//!
//! ```
//! use iqlink_core::hardware::WriteStatus;
//! use iqlink_test_harness::MockHardware;
//!
//! let hw = MockHardware::new("mock-sdr");
//! // The next two frames hit a full queue, then a hardware underrun.
//! hw.push_write_status(WriteStatus::Timeout);
//! hw.push_write_status(WriteStatus::Underflow);
//! ```

use async_trait::async_trait;
use num_complex::Complex32;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use iqlink_core::error::{Error, Result};
use iqlink_core::hardware::{
    Hardware, HardwareDriver, ReadResult, ReadStatus, RxStream, SensorValue, TxStream, WriteStatus,
};
use iqlink_core::types::{Direction, GainRange, Timestamp};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One recorded TX stream write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    /// Number of samples in the write.
    pub len: usize,
    /// The timestamp the frame carried.
    pub timestamp: Timestamp,
}

/// A queued block of RX samples with its hardware timestamp.
struct RxBlock {
    samples: Vec<Complex32>,
    timestamp: u64,
}

/// Scriptable state shared between the mock hardware and its streams.
#[derive(Default)]
struct MockState {
    frequencies: HashMap<Direction, f64>,
    gains: HashMap<Direction, f64>,
    sample_rate_hz: f64,
    sensors: HashMap<String, SensorValue>,
    /// Pending TX statuses; an empty queue means `Accepted`.
    write_script: VecDeque<WriteStatus>,
    /// When set, every TX write fails with this message.
    tx_fault: Option<String>,
    /// When set, every RX read fails with this message.
    rx_fault: Option<String>,
    /// Queued RX sample blocks, consumed front-first.
    rx_blocks: VecDeque<RxBlock>,
    /// The next RX read reports a hardware overflow.
    rx_overflow_pending: bool,
    /// Frequencies above this limit are rejected by `set_frequency`.
    frequency_limit_hz: Option<f64>,
    /// Added latency on every hardware read (frequency, gain, sensors, time).
    query_delay: Option<Duration>,
    /// Log of all TX stream writes.
    tx_log: Vec<TxRecord>,
}

/// A mock [`Hardware`] backend with scriptable faults and sensors.
///
/// All scripting methods take `&self`, so a test can keep an `Arc` clone
/// next to the device and adjust the script between calls.
pub struct MockHardware {
    name: String,
    tx_gain_range: GainRange,
    rx_gain_range: GainRange,
    state: Arc<Mutex<MockState>>,
    ticks: Arc<AtomicU64>,
    sensor_queries: AtomicU64,
}

impl MockHardware {
    /// Create a mock device with default gain ranges (TX 0-60 dB,
    /// RX 0-50 dB), no sensors, and the sample clock at zero.
    pub fn new(name: &str) -> Self {
        MockHardware {
            name: name.to_string(),
            tx_gain_range: GainRange::new(0.0, 60.0),
            rx_gain_range: GainRange::new(0.0, 50.0),
            state: Arc::new(Mutex::new(MockState::default())),
            ticks: Arc::new(AtomicU64::new(0)),
            sensor_queries: AtomicU64::new(0),
        }
    }

    /// Override the advertised gain range for one direction.
    pub fn with_gain_range(mut self, direction: Direction, range: GainRange) -> Self {
        match direction {
            Direction::Tx => self.tx_gain_range = range,
            Direction::Rx => self.rx_gain_range = range,
        }
        self
    }

    /// Set or replace a named sensor value.
    pub fn set_sensor(&self, name: &str, value: SensorValue) {
        lock(&self.state).sensors.insert(name.to_string(), value);
    }

    /// Remove a sensor, making later queries report `Unsupported`.
    pub fn remove_sensor(&self, name: &str) {
        lock(&self.state).sensors.remove(name);
    }

    /// Total number of sensor queries served, for asserting no caching.
    pub fn sensor_queries(&self) -> u64 {
        self.sensor_queries.load(Ordering::Relaxed)
    }

    /// Queue a status for an upcoming TX write. Writes beyond the queue
    /// report [`WriteStatus::Accepted`].
    pub fn push_write_status(&self, status: WriteStatus) {
        lock(&self.state).write_script.push_back(status);
    }

    /// Make every TX write from now on fail unrecoverably.
    pub fn fail_tx(&self, detail: &str) {
        lock(&self.state).tx_fault = Some(detail.to_string());
    }

    /// Make every RX read from now on fail unrecoverably.
    pub fn fail_rx(&self, detail: &str) {
        lock(&self.state).rx_fault = Some(detail.to_string());
    }

    /// Queue a block of RX samples carrying the given first-sample timestamp.
    pub fn push_rx_block(&self, samples: Vec<Complex32>, timestamp: u64) {
        lock(&self.state)
            .rx_blocks
            .push_back(RxBlock { samples, timestamp });
    }

    /// Make the next RX read report a hardware overflow.
    pub fn mark_rx_overflow(&self) {
        lock(&self.state).rx_overflow_pending = true;
    }

    /// Reject `set_frequency` calls above this limit, simulating the edge
    /// of the hardware's RF range.
    pub fn set_frequency_limit(&self, limit_hz: f64) {
        lock(&self.state).frequency_limit_hz = Some(limit_hz);
    }

    /// Delay every hardware read by `delay`, simulating slow or wedged
    /// hardware. `Duration::ZERO` removes the delay.
    pub fn set_query_delay(&self, delay: Duration) {
        lock(&self.state).query_delay = if delay.is_zero() { None } else { Some(delay) };
    }

    async fn query_latency(&self) {
        let delay = lock(&self.state).query_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// All TX writes recorded so far.
    pub fn tx_log(&self) -> Vec<TxRecord> {
        lock(&self.state).tx_log.clone()
    }

    /// The most recently applied sample rate.
    pub fn sample_rate(&self) -> f64 {
        lock(&self.state).sample_rate_hz
    }

    /// Advance the sample clock by `ticks`.
    pub fn advance_ticks(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Set the sample clock to an absolute tick count.
    pub fn set_ticks(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::Relaxed);
    }
}

#[async_trait]
impl Hardware for MockHardware {
    fn name(&self) -> &str {
        &self.name
    }

    fn gain_range(&self, direction: Direction) -> GainRange {
        match direction {
            Direction::Tx => self.tx_gain_range,
            Direction::Rx => self.rx_gain_range,
        }
    }

    async fn set_sample_rate(&self, rate_hz: f64) -> Result<()> {
        lock(&self.state).sample_rate_hz = rate_hz;
        Ok(())
    }

    async fn set_frequency(&self, direction: Direction, freq_hz: f64) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(limit) = state.frequency_limit_hz {
            if freq_hz > limit {
                return Err(Error::Hardware(format!(
                    "frequency {freq_hz} Hz above RF range limit {limit} Hz"
                )));
            }
        }
        state.frequencies.insert(direction, freq_hz);
        Ok(())
    }

    async fn frequency(&self, direction: Direction) -> Result<f64> {
        self.query_latency().await;
        Ok(lock(&self.state)
            .frequencies
            .get(&direction)
            .copied()
            .unwrap_or(0.0))
    }

    async fn set_gain(&self, direction: Direction, gain_db: f64) -> Result<()> {
        lock(&self.state).gains.insert(direction, gain_db);
        Ok(())
    }

    async fn gain(&self, direction: Direction) -> Result<f64> {
        self.query_latency().await;
        Ok(lock(&self.state)
            .gains
            .get(&direction)
            .copied()
            .unwrap_or(0.0))
    }

    async fn create_tx_stream(&self) -> Result<Box<dyn TxStream>> {
        Ok(Box::new(MockTxStream {
            state: Arc::clone(&self.state),
        }))
    }

    async fn create_rx_stream(&self) -> Result<Box<dyn RxStream>> {
        Ok(Box::new(MockRxStream {
            state: Arc::clone(&self.state),
        }))
    }

    async fn query_sensor(&self, name: &str) -> Result<SensorValue> {
        self.query_latency().await;
        self.sensor_queries.fetch_add(1, Ordering::Relaxed);
        lock(&self.state)
            .sensors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Unsupported(format!("no sensor named '{name}'")))
    }

    async fn time_ticks(&self) -> Result<u64> {
        self.query_latency().await;
        Ok(self.ticks.load(Ordering::Relaxed))
    }
}

/// TX stream over the shared mock state.
struct MockTxStream {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl TxStream for MockTxStream {
    async fn write(&mut self, samples: &[Complex32], timestamp: Timestamp) -> Result<WriteStatus> {
        let mut state = lock(&self.state);
        if let Some(detail) = &state.tx_fault {
            return Err(Error::Hardware(detail.clone()));
        }
        let status = state.write_script.pop_front().unwrap_or(WriteStatus::Accepted);
        // Dropped frames never reach the hardware queue, so don't log them.
        if !matches!(status, WriteStatus::TimeError | WriteStatus::Timeout) {
            state.tx_log.push(TxRecord {
                len: samples.len(),
                timestamp,
            });
        }
        Ok(status)
    }
}

/// RX stream over the shared mock state.
struct MockRxStream {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl RxStream for MockRxStream {
    async fn read(&mut self, buf: &mut [Complex32], timeout: Duration) -> Result<ReadResult> {
        {
            let mut state = lock(&self.state);
            if let Some(detail) = &state.rx_fault {
                return Err(Error::Hardware(detail.clone()));
            }

            if let Some(mut block) = state.rx_blocks.pop_front() {
                let n = block.samples.len().min(buf.len());
                buf[..n].copy_from_slice(&block.samples[..n]);
                let timestamp = block.timestamp;
                if n < block.samples.len() {
                    // Keep the tail for the next read, at its own timestamp.
                    block.samples.drain(..n);
                    block.timestamp += n as u64;
                    state.rx_blocks.push_front(block);
                }
                let status = if state.rx_overflow_pending {
                    state.rx_overflow_pending = false;
                    ReadStatus::Overflow
                } else {
                    ReadStatus::Ok
                };
                return Ok(ReadResult {
                    count: n,
                    timestamp,
                    status,
                });
            }
        }

        // Nothing queued: honor the timeout, then report an empty read.
        if !timeout.is_zero() {
            tokio::time::sleep(timeout).await;
        }
        Ok(ReadResult {
            count: 0,
            timestamp: 0,
            status: ReadStatus::Timeout,
        })
    }
}

/// A [`HardwareDriver`] yielding one pre-built [`MockHardware`].
///
/// Records the `device_args` it was opened with, so tests can assert the
/// selection string flowed through the builder.
pub struct MockDriver {
    hardware: Arc<MockHardware>,
    opened_with: Mutex<Vec<String>>,
}

impl MockDriver {
    /// Create a driver that always opens the given mock.
    pub fn new(hardware: Arc<MockHardware>) -> Self {
        MockDriver {
            hardware,
            opened_with: Mutex::new(Vec::new()),
        }
    }

    /// The device-selection strings passed to `open()` so far.
    pub fn opened_with(&self) -> Vec<String> {
        lock(&self.opened_with).clone()
    }
}

#[async_trait]
impl HardwareDriver for MockDriver {
    async fn open(&self, device_args: &str) -> Result<Arc<dyn Hardware>> {
        lock(&self.opened_with).push(device_args.to_string());
        Ok(Arc::clone(&self.hardware) as Arc<dyn Hardware>)
    }
}
