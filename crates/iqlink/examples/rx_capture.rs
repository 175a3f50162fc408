//! Capture receive frames and check clock health.
//!
//! Demonstrates the receive side of the contract: queue sample blocks on the
//! mock backend, drain them with timeout-bounded reads, and poll the GPS
//! clock discipline sensors between frames.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p iqlink --features mock --example rx_capture
//! ```

use std::sync::Arc;
use std::time::Duration;

use iqlink::mock::MockHardware;
use iqlink::{ClockSource, Complex32, DeviceBuilder, DeviceConfig, SdrDevice, SensorValue};

const BLOCK_LEN: usize = 2048;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = DeviceConfig::new(145_500_000.0, 2_048_000.0);
    config.device_args = "driver=mock".into();
    config.rx_gain_db = 20.0;
    config.clock_source = ClockSource::Gps;

    let hw = Arc::new(MockHardware::new("demo-sdr"));
    hw.set_sensor("gps_locked", SensorValue::Bool(true));
    hw.set_sensor("ref_locked", SensorValue::Bool(true));

    // Queue a few blocks of captured I/Q ahead of time.
    for block in 0..8u64 {
        let samples: Vec<Complex32> = (0..BLOCK_LEN)
            .map(|i| Complex32::new(i as f32 / BLOCK_LEN as f32, 0.0))
            .collect();
        hw.push_rx_block(samples, block * BLOCK_LEN as u64);
    }

    let device = DeviceBuilder::new(config)
        .build_with_hardware(Arc::clone(&hw) as Arc<dyn iqlink::Hardware>)
        .await?;

    let mut buf = vec![Complex32::new(0.0, 0.0); BLOCK_LEN];
    let mut total = 0usize;
    loop {
        let rx = device
            .receive_frame(&mut buf, Duration::from_millis(20))
            .await?;
        if rx.count == 0 {
            break;
        }
        total += rx.count;
        match rx.timestamp {
            Some(ticks) => println!("got {} samples at tick {}", rx.count, ticks),
            None => println!("got {} samples (no timestamp)", rx.count),
        }

        if !device.is_clock_source_ok().await? {
            eprintln!("warning: GPS discipline lost, samples may drift");
        }
    }

    println!(
        "captured {} samples, device time {:.3} s",
        total,
        device.real_time_secs().await?
    );
    Ok(())
}
