//! Timestamped transmit loop against the mock backend.
//!
//! Demonstrates the core transmit contract: build a device from a
//! [`DeviceConfig`], stamp each frame one frame-length after the previous
//! one, and watch the run statistics accumulate as transient faults are
//! injected mid-stream.
//!
//! No hardware is required; the mock backend stands in for a real radio.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p iqlink --features mock --example transmit_loop
//! ```

use std::sync::Arc;

use iqlink::mock::MockHardware;
use iqlink::{Complex32, DeviceBuilder, DeviceConfig, SampleFrame, SdrDevice, WriteStatus};

/// Samples per transmitted frame.
const FRAME_LEN: usize = 4096;

/// Number of frames to send.
const FRAMES: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = DeviceConfig::new(222_064_000.0, 2_048_000.0);
    config.device_args = "driver=mock".into();
    config.lo_offset_hz = -100_000.0;
    config.tx_gain_db = 30.0;

    let hw = Arc::new(MockHardware::new("demo-sdr"));
    let device = DeviceBuilder::new(config)
        .build_with_hardware(Arc::clone(&hw) as Arc<dyn iqlink::Hardware>)
        .await?;

    println!(
        "Transmitting on {} at {} Hz",
        device.device_name(),
        device.tx_frequency().await?
    );

    // A constant-envelope tone; any I/Q payload works.
    let samples: Vec<Complex32> = (0..FRAME_LEN)
        .map(|i| {
            let phase = i as f32 * 0.05;
            Complex32::new(phase.cos() * 0.5, phase.sin() * 0.5)
        })
        .collect();

    let mut ticks = 2_048_000u64;
    for n in 0..FRAMES {
        // Inject an underflow and an FPGA FIFO stall partway through.
        if n == 30 {
            hw.push_write_status(WriteStatus::Underflow);
        }
        if n == 60 {
            hw.push_write_status(WriteStatus::Timeout);
        }

        device
            .transmit_frame(SampleFrame::at_ticks(&samples, ticks)?)
            .await?;
        ticks += FRAME_LEN as u64;
    }

    // One deliberately stale frame: counted late and dropped, not an error.
    device
        .transmit_frame(SampleFrame::at_ticks(&samples, 100)?)
        .await?;

    println!("Final statistics: {}", device.run_statistics());
    Ok(())
}
