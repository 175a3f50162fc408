//! Integration tests for the frame-transport engine over mock hardware.
//!
//! These exercise the full contract: tune/gain round trips, transient fault
//! accounting (underflow/overflow/late), the fatal latch, timeout-bounded
//! receive, clock discipline, and TX/RX path independence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use num_complex::Complex32;

use iqlink_core::error::Error;
use iqlink_core::frame::SampleFrame;
use iqlink_core::hardware::{SensorValue, WriteStatus};
use iqlink_core::types::{ClockSource, Direction, GainRange, Timestamp};
use iqlink_core::{DeviceConfig, Hardware, SdrDevice};
use iqlink_device::clock::{GPS_LOCK_SENSOR, REF_LOCK_SENSOR};
use iqlink_device::{DeviceBuilder, StreamDevice};
use iqlink_test_harness::{MockDriver, MockHardware};

const FREQ_HZ: f64 = 222_064_000.0;
const LO_OFFSET_HZ: f64 = -100_000.0;
const SAMPLE_RATE_HZ: f64 = 2_048_000.0;

fn test_config() -> DeviceConfig {
    let mut config = DeviceConfig::new(FREQ_HZ, SAMPLE_RATE_HZ);
    config.device_args = "driver=mock".into();
    config.lo_offset_hz = LO_OFFSET_HZ;
    config.tx_gain_db = 30.0;
    config.rx_gain_db = 15.0;
    config
}

async fn build_device(hw: &Arc<MockHardware>, config: DeviceConfig) -> StreamDevice {
    DeviceBuilder::new(config)
        .build_with_hardware(Arc::clone(hw) as Arc<dyn Hardware>)
        .await
        .expect("device build should succeed")
}

fn iq(n: usize) -> Vec<Complex32> {
    (0..n).map(|i| Complex32::new(i as f32, -(i as f32))).collect()
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn build_applies_full_config() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    assert_eq!(device.device_name(), "mock-sdr");
    assert_eq!(hw.sample_rate(), SAMPLE_RATE_HZ);

    let center = FREQ_HZ + LO_OFFSET_HZ;
    assert_eq!(hw.frequency(Direction::Tx).await.unwrap(), center);
    assert_eq!(hw.frequency(Direction::Rx).await.unwrap(), center);
    assert_eq!(hw.gain(Direction::Tx).await.unwrap(), 30.0);
    assert_eq!(hw.gain(Direction::Rx).await.unwrap(), 15.0);
}

#[tokio::test]
async fn build_rejects_invalid_config() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let mut config = test_config();
    config.sample_rate_hz = 0.0;

    let result = DeviceBuilder::new(config)
        .build_with_hardware(hw as Arc<dyn Hardware>)
        .await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn build_rejects_out_of_range_config_gain() {
    let hw = Arc::new(
        MockHardware::new("mock-sdr").with_gain_range(Direction::Tx, GainRange::new(0.0, 20.0)),
    );
    let config = test_config(); // tx_gain_db = 30.0

    let result = DeviceBuilder::new(config)
        .build_with_hardware(hw as Arc<dyn Hardware>)
        .await;
    assert!(matches!(result, Err(Error::GainOutOfRange { .. })));
}

#[tokio::test]
async fn build_with_driver_passes_device_args() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let driver = MockDriver::new(Arc::clone(&hw));

    let device = DeviceBuilder::new(test_config())
        .build_with_driver(&driver)
        .await
        .unwrap();

    assert_eq!(driver.opened_with(), vec!["driver=mock"]);
    assert_eq!(device.device_name(), "mock-sdr");
}

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tune_then_read_back_includes_lo_offset() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    device.tune(-80_000.0, 145_500_000.0).await.unwrap();
    assert_eq!(device.tx_frequency().await.unwrap(), 145_420_000.0);

    let config = device.config();
    assert_eq!(config.frequency_hz, 145_500_000.0);
    assert_eq!(config.lo_offset_hz, -80_000.0);
}

#[tokio::test]
async fn tune_rejects_non_positive_center() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    // Negative frequency, and a LO offset pushing the center below zero:
    // both must fail before any hardware call or config change.
    for (lo, freq) in [(0.0, -5.0), (0.0, 0.0), (-300_000_000.0, 222_064_000.0)] {
        let result = device.tune(lo, freq).await;
        assert!(
            matches!(result, Err(Error::InvalidParameter(_))),
            "tune({lo}, {freq}) should be rejected"
        );
    }

    assert_eq!(device.config().frequency_hz, FREQ_HZ);
    assert_eq!(
        device.tx_frequency().await.unwrap(),
        FREQ_HZ + LO_OFFSET_HZ
    );
}

#[tokio::test]
async fn failed_tune_leaves_device_unchanged() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    hw.set_frequency_limit(1_000_000_000.0);

    let result = device.tune(0.0, 7_000_000_000.0).await;
    assert!(matches!(result, Err(Error::Tune(_))));

    // Hardware and config both still at the original tuning.
    assert_eq!(
        device.tx_frequency().await.unwrap(),
        FREQ_HZ + LO_OFFSET_HZ
    );
    assert_eq!(device.config().frequency_hz, FREQ_HZ);
}

// ---------------------------------------------------------------------------
// Gain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gain_round_trip_within_range() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    device.set_tx_gain(42.5).await.unwrap();
    assert_eq!(device.tx_gain().await.unwrap(), 42.5);
    assert_eq!(device.config().tx_gain_db, 42.5);

    device.set_rx_gain(12.0).await.unwrap();
    assert_eq!(device.rx_gain().await.unwrap(), 12.0);
}

#[tokio::test]
async fn out_of_range_gain_fails_without_side_effects() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    for bad in [-0.1, 60.1, 500.0] {
        let result = device.set_tx_gain(bad).await;
        assert!(
            matches!(result, Err(Error::GainOutOfRange { .. })),
            "gain {bad} should be rejected"
        );
    }

    // Hardware and config still hold the build-time gain.
    assert_eq!(device.tx_gain().await.unwrap(), 30.0);
    assert_eq!(device.config().tx_gain_db, 30.0);
}

// ---------------------------------------------------------------------------
// Transmit path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn in_order_frames_never_count_late() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(256);

    let mut ticks = 10_000u64;
    for _ in 0..20 {
        let frame = SampleFrame::at_ticks(&samples, ticks).unwrap();
        device.transmit_frame(frame).await.unwrap();
        ticks += samples.len() as u64;
    }

    let stats = device.run_statistics();
    assert_eq!(stats.late_packets, 0);
    assert_eq!(stats.frames_transmitted, 20);
    assert_eq!(hw.tx_log().len(), 20);
}

#[tokio::test]
async fn stale_timestamp_counts_one_late_and_drops_frame() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(256);

    device
        .transmit_frame(SampleFrame::at_ticks(&samples, 10_000).unwrap())
        .await
        .unwrap();

    // Earlier than the end of the previous frame: late, dropped, non-fatal.
    device
        .transmit_frame(SampleFrame::at_ticks(&samples, 9_000).unwrap())
        .await
        .unwrap();

    let stats = device.run_statistics();
    assert_eq!(stats.late_packets, 1);
    assert_eq!(stats.frames_transmitted, 1);
    assert_eq!(hw.tx_log().len(), 1, "late frame must not reach hardware");

    // The stream continues in order afterwards.
    device
        .transmit_frame(SampleFrame::at_ticks(&samples, 10_256).unwrap())
        .await
        .unwrap();
    assert_eq!(device.run_statistics().late_packets, 1);
    assert_eq!(device.run_statistics().frames_transmitted, 2);
}

#[tokio::test]
async fn hardware_reported_late_frame_is_counted() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(64);

    hw.push_write_status(WriteStatus::TimeError);
    device
        .transmit_frame(SampleFrame::at_ticks(&samples, 500).unwrap())
        .await
        .unwrap();

    let stats = device.run_statistics();
    assert_eq!(stats.late_packets, 1);
    assert_eq!(stats.frames_transmitted, 0);
}

#[tokio::test]
async fn now_frames_are_exempt_from_late_detection() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(64);

    device
        .transmit_frame(SampleFrame::at_ticks(&samples, 10_000).unwrap())
        .await
        .unwrap();
    device
        .transmit_frame(SampleFrame::now(&samples).unwrap())
        .await
        .unwrap();

    let stats = device.run_statistics();
    assert_eq!(stats.late_packets, 0);
    assert_eq!(stats.frames_transmitted, 2);
    assert_eq!(hw.tx_log()[1].timestamp, Timestamp::Now);
}

#[tokio::test]
async fn overflow_events_are_counted_and_non_fatal() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(128);

    for _ in 0..3 {
        hw.push_write_status(WriteStatus::Timeout);
    }
    for _ in 0..5 {
        device
            .transmit_frame(SampleFrame::now(&samples).unwrap())
            .await
            .unwrap();
    }

    let stats = device.run_statistics();
    assert_eq!(stats.overflows, 3);
    assert_eq!(stats.frames_transmitted, 2);
    assert_eq!(stats.underflows, 0);
}

#[tokio::test]
async fn underflow_events_are_counted_and_frames_still_sent() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(128);

    hw.push_write_status(WriteStatus::Underflow);
    device
        .transmit_frame(SampleFrame::now(&samples).unwrap())
        .await
        .unwrap();

    let stats = device.run_statistics();
    assert_eq!(stats.underflows, 1);
    assert_eq!(stats.frames_transmitted, 1);
    assert_eq!(hw.tx_log().len(), 1);
}

// ---------------------------------------------------------------------------
// Receive path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn receive_fills_buffer_and_reports_timestamp() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    hw.push_rx_block(iq(512), 777_000);
    let mut buf = vec![Complex32::new(0.0, 0.0); 512];
    let rx = device
        .receive_frame(&mut buf, Duration::from_millis(100))
        .await
        .unwrap();

    assert_eq!(rx.count, 512);
    assert_eq!(rx.timestamp, Some(777_000));
    assert_eq!(buf[5], Complex32::new(5.0, -5.0));
}

#[tokio::test]
async fn receive_zero_timeout_empty_returns_promptly() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    let mut buf = vec![Complex32::new(0.0, 0.0); 256];
    let started = Instant::now();
    let rx = device.receive_frame(&mut buf, Duration::ZERO).await.unwrap();

    assert_eq!(rx.count, 0);
    assert_eq!(rx.timestamp, None);
    assert!(
        started.elapsed() < Duration::from_millis(50),
        "empty zero-timeout read must not block"
    );
}

#[tokio::test]
async fn short_read_is_not_an_error() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    hw.push_rx_block(iq(100), 42);
    let mut buf = vec![Complex32::new(0.0, 0.0); 256];
    let rx = device
        .receive_frame(&mut buf, Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(rx.count, 100);
    assert_eq!(rx.timestamp, Some(42));
}

#[tokio::test]
async fn rx_overflow_is_counted_not_raised() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    hw.push_rx_block(iq(64), 0);
    hw.mark_rx_overflow();
    let mut buf = vec![Complex32::new(0.0, 0.0); 64];
    device
        .receive_frame(&mut buf, Duration::from_millis(10))
        .await
        .unwrap();

    assert_eq!(device.run_statistics().overflows, 1);
}

#[tokio::test]
async fn empty_receive_buffer_is_rejected() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    let mut buf: Vec<Complex32> = Vec::new();
    let result = device.receive_frame(&mut buf, Duration::ZERO).await;
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

// ---------------------------------------------------------------------------
// Fatal faults
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tx_fault_latches_the_device() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(64);

    hw.fail_tx("stream aborted");
    let first = device
        .transmit_frame(SampleFrame::now(&samples).unwrap())
        .await;
    assert!(matches!(first, Err(Error::TransmitFatal { .. })));

    // Every later call fails deterministically without touching hardware.
    let writes_before = hw.tx_log().len();
    for _ in 0..3 {
        let result = device
            .transmit_frame(SampleFrame::now(&samples).unwrap())
            .await;
        assert!(matches!(result, Err(Error::DeviceFatal { .. })));
    }
    assert_eq!(hw.tx_log().len(), writes_before);

    // The RX path and control plane are latched out too.
    let mut buf = vec![Complex32::new(0.0, 0.0); 16];
    assert!(matches!(
        device.receive_frame(&mut buf, Duration::ZERO).await,
        Err(Error::DeviceFatal { .. })
    ));
    assert!(matches!(
        device.tune(0.0, 145_000_000.0).await,
        Err(Error::DeviceFatal { .. })
    ));
    assert!(matches!(
        device.set_tx_gain(10.0).await,
        Err(Error::DeviceFatal { .. })
    ));
}

#[tokio::test]
async fn rx_fault_latches_the_device() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    hw.fail_rx("device unplugged");
    let mut buf = vec![Complex32::new(0.0, 0.0); 16];
    let first = device.receive_frame(&mut buf, Duration::ZERO).await;
    assert!(matches!(first, Err(Error::ReceiveFatal { .. })));

    let samples = iq(16);
    assert!(matches!(
        device.transmit_frame(SampleFrame::now(&samples).unwrap()).await,
        Err(Error::DeviceFatal { .. })
    ));
}

#[tokio::test]
async fn fatal_error_names_the_device() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(16);

    hw.fail_tx("stream aborted");
    let err = device
        .transmit_frame(SampleFrame::now(&samples).unwrap())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("mock-sdr"));
    assert!(message.contains("stream aborted"));
}

#[tokio::test]
async fn statistics_survive_the_fatal_latch() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;
    let samples = iq(64);

    hw.push_write_status(WriteStatus::Timeout);
    device
        .transmit_frame(SampleFrame::now(&samples).unwrap())
        .await
        .unwrap();
    hw.fail_tx("stream aborted");
    let _ = device
        .transmit_frame(SampleFrame::now(&samples).unwrap())
        .await;

    // The telemetry poller still gets the pre-fault counters.
    let stats = device.run_statistics();
    assert_eq!(stats.overflows, 1);
}

// ---------------------------------------------------------------------------
// Clock and time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn real_time_secs_follows_sample_clock() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    hw.set_ticks(2_048_000);
    assert!((device.real_time_secs().await.unwrap() - 1.0).abs() < 1e-12);

    hw.advance_ticks(1_024_000);
    assert!((device.real_time_secs().await.unwrap() - 1.5).abs() < 1e-12);
}

#[tokio::test]
async fn slow_hardware_query_times_out() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = DeviceBuilder::new(test_config())
        .query_timeout(Duration::from_millis(20))
        .build_with_hardware(Arc::clone(&hw) as Arc<dyn Hardware>)
        .await
        .unwrap();

    hw.set_query_delay(Duration::from_millis(200));
    assert!(matches!(
        device.tx_frequency().await,
        Err(Error::Timeout)
    ));
    assert!(matches!(
        device.real_time_secs().await,
        Err(Error::Timeout)
    ));

    // The timeout is transient: responsive hardware answers again.
    hw.set_query_delay(Duration::ZERO);
    assert_eq!(
        device.tx_frequency().await.unwrap(),
        FREQ_HZ + LO_OFFSET_HZ
    );
}

#[tokio::test]
async fn internal_clock_source_is_trivially_ok() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = build_device(&hw, test_config()).await;

    assert!(device.is_clock_source_ok().await.unwrap());
    // No sensor was consulted for the internal source.
    assert_eq!(hw.sensor_queries(), 0);
}

#[tokio::test]
async fn gps_clock_source_polls_sensors_every_call() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let mut config = test_config();
    config.clock_source = ClockSource::Gps;
    let device = build_device(&hw, config).await;

    hw.set_sensor(GPS_LOCK_SENSOR, SensorValue::Bool(true));
    hw.set_sensor(REF_LOCK_SENSOR, SensorValue::Bool(true));
    assert!(device.is_clock_source_ok().await.unwrap());

    // Losing lock is visible on the very next poll: no caching.
    hw.set_sensor(GPS_LOCK_SENSOR, SensorValue::Bool(false));
    assert!(!device.is_clock_source_ok().await.unwrap());

    hw.set_sensor(GPS_LOCK_SENSOR, SensorValue::Bool(true));
    assert!(device.is_clock_source_ok().await.unwrap());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tx_and_rx_paths_run_concurrently() {
    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let device = Arc::new(build_device(&hw, test_config()).await);

    for i in 0..50 {
        hw.push_rx_block(iq(256), i * 256);
    }

    let tx_device = Arc::clone(&device);
    let tx_task = tokio::spawn(async move {
        let samples = iq(256);
        let mut ticks = 1_000_000u64;
        for _ in 0..50 {
            let frame = SampleFrame::at_ticks(&samples, ticks).unwrap();
            tx_device.transmit_frame(frame).await.unwrap();
            ticks += 256;
        }
    });

    let rx_device = Arc::clone(&device);
    let rx_task = tokio::spawn(async move {
        let mut buf = vec![Complex32::new(0.0, 0.0); 256];
        let mut total = 0usize;
        for _ in 0..50 {
            let rx = rx_device
                .receive_frame(&mut buf, Duration::from_millis(5))
                .await
                .unwrap();
            total += rx.count;
        }
        total
    });

    tx_task.await.unwrap();
    let received = rx_task.await.unwrap();

    let stats = device.run_statistics();
    assert_eq!(stats.frames_transmitted, 50);
    assert_eq!(stats.late_packets, 0);
    assert_eq!(received, 50 * 256);
}
