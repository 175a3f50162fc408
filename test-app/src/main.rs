// iqlink test application -- CLI tool for exercising the frame transport
// engine against the scriptable mock backend.
//
// Usage:
//   iqlink-test-app info
//   iqlink-test-app --freq 222064000 --lo-offset -100000 tune 145500000
//   iqlink-test-app gain tx set 30
//   iqlink-test-app --clock-source gps clock --polls 5
//   iqlink-test-app rx --frames 10 --timeout-ms 20
//   iqlink-test-app soak --seconds 2 --phases pacing,faults,duplex,fatal
//
// All commands run against MockHardware; RUST_LOG=debug shows the engine's
// tracing output.

mod soak;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use iqlink::mock::MockHardware;
use iqlink::{
    ClockSource, Complex32, DeviceBuilder, DeviceConfig, Hardware, SdrDevice, SensorValue,
    StreamDevice,
};

/// iqlink test application -- exercises the frame transport from the command line.
#[derive(Parser)]
#[command(name = "iqlink-test-app", version, about)]
struct Cli {
    /// Device argument string passed to the driver.
    #[arg(long, default_value = "driver=mock")]
    args: String,

    /// Application-facing frequency in Hz.
    #[arg(long, default_value_t = 222_064_000.0)]
    freq: f64,

    /// Local oscillator offset in Hz (hardware center = freq + offset).
    #[arg(long, default_value_t = 0.0)]
    lo_offset: f64,

    /// Sample rate in Hz.
    #[arg(long, default_value_t = 2_048_000.0)]
    rate: f64,

    /// Initial TX gain in dB.
    #[arg(long, default_value_t = 30.0)]
    tx_gain: f64,

    /// Initial RX gain in dB.
    #[arg(long, default_value_t = 15.0)]
    rx_gain: f64,

    /// Clock source: internal, external, or gps.
    #[arg(long, default_value = "internal")]
    clock_source: String,

    /// Simulate missing reference/GPS lock on the mock hardware.
    #[arg(long)]
    unlocked: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print device configuration and clock status.
    Info,

    /// Retune and read the hardware center frequency back.
    Tune {
        /// New application-facing frequency in Hz.
        freq_hz: f64,

        /// New LO offset in Hz (defaults to the global --lo-offset).
        #[arg(long)]
        lo_offset: Option<f64>,
    },

    /// Gain operations.
    Gain {
        #[command(subcommand)]
        action: GainAction,
    },

    /// Poll clock discipline and device time.
    Clock {
        /// Number of polls.
        #[arg(long, default_value_t = 3)]
        polls: u32,

        /// Interval between polls in milliseconds.
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },

    /// Drain queued receive frames.
    Rx {
        /// Number of frames to queue and read.
        #[arg(long, default_value_t = 10)]
        frames: usize,

        /// Per-read timeout in milliseconds.
        #[arg(long, default_value_t = 20)]
        timeout_ms: u64,
    },

    /// Soak test: paced transmit, fault injection, duplex, fatal latch.
    Soak {
        /// Seconds per phase.
        #[arg(long, default_value_t = 2)]
        seconds: u64,

        /// Samples per frame.
        #[arg(long, default_value_t = 4096)]
        frame_len: usize,

        /// Comma-separated phases: pacing, faults, duplex, fatal, or "all".
        #[arg(long, default_value = "all")]
        phases: String,
    },
}

#[derive(Subcommand)]
enum GainAction {
    /// Read the current TX gain.
    Tx {
        #[command(subcommand)]
        action: GainOp,
    },
    /// Read the current RX gain.
    Rx {
        #[command(subcommand)]
        action: GainOp,
    },
}

#[derive(Subcommand)]
enum GainOp {
    /// Read the gain from hardware.
    Get,
    /// Set the gain in dB.
    Set { gain_db: f64 },
}

/// Build the mock hardware and a device over it from the CLI options.
async fn create_device(cli: &Cli) -> Result<(Arc<MockHardware>, StreamDevice)> {
    let clock_source = ClockSource::from_str(&cli.clock_source)
        .map_err(|e| anyhow::anyhow!("--clock-source: {e}"))?;

    let mut config = DeviceConfig::new(cli.freq, cli.rate);
    config.device_args = cli.args.clone();
    config.lo_offset_hz = cli.lo_offset;
    config.tx_gain_db = cli.tx_gain;
    config.rx_gain_db = cli.rx_gain;
    config.clock_source = clock_source;

    let hw = Arc::new(MockHardware::new("mock-sdr"));
    let locked = !cli.unlocked;
    hw.set_sensor("ref_locked", SensorValue::Bool(locked));
    hw.set_sensor("gps_locked", SensorValue::Bool(locked));

    let device = DeviceBuilder::new(config)
        .build_with_hardware(Arc::clone(&hw) as Arc<dyn Hardware>)
        .await
        .context("failed to build device")?;

    Ok((hw, device))
}

fn format_freq(hz: f64) -> String {
    format!("{:.6} MHz", hz / 1_000_000.0)
}

async fn cmd_info(device: &StreamDevice) -> Result<()> {
    let config = device.config();

    println!("Device Information");
    println!("  Name:           {}", device.device_name());
    println!("  Frequency:      {}", format_freq(config.frequency_hz));
    println!("  LO offset:      {} Hz", config.lo_offset_hz);
    println!(
        "  HW center:      {}",
        format_freq(device.tx_frequency().await?)
    );
    println!("  Sample rate:    {} Hz", config.sample_rate_hz);
    println!("  TX gain:        {} dB", device.tx_gain().await?);
    println!("  RX gain:        {} dB", device.rx_gain().await?);
    println!("  Clock source:   {}", config.clock_source);
    println!(
        "  Clock OK:       {}",
        device.is_clock_source_ok().await?
    );
    println!("  Device time:    {:.6} s", device.real_time_secs().await?);
    println!("  Statistics:     {}", device.run_statistics());
    Ok(())
}

async fn cmd_tune(device: &StreamDevice, lo_offset_hz: f64, freq_hz: f64) -> Result<()> {
    device.tune(lo_offset_hz, freq_hz).await?;
    println!(
        "tuned to {} (hardware center {})",
        format_freq(freq_hz),
        format_freq(device.tx_frequency().await?)
    );
    Ok(())
}

async fn cmd_clock(device: &StreamDevice, polls: u32, interval: Duration) -> Result<()> {
    for i in 1..=polls {
        let ok = device.is_clock_source_ok().await?;
        let secs = device.real_time_secs().await?;
        println!(
            "[{i}/{polls}] clock {} device time {secs:.6} s",
            if ok { "locked" } else { "UNLOCKED" }
        );
        if i < polls {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(())
}

async fn cmd_rx(
    hw: &MockHardware,
    device: &StreamDevice,
    frames: usize,
    timeout: Duration,
) -> Result<()> {
    const BLOCK_LEN: usize = 2048;

    for n in 0..frames as u64 {
        let samples = vec![Complex32::new(0.1, -0.1); BLOCK_LEN];
        hw.push_rx_block(samples, n * BLOCK_LEN as u64);
    }

    let mut buf = vec![Complex32::new(0.0, 0.0); BLOCK_LEN];
    let mut total = 0usize;
    loop {
        let rx = device.receive_frame(&mut buf, timeout).await?;
        if rx.count == 0 {
            break;
        }
        total += rx.count;
        match rx.timestamp {
            Some(ticks) => println!("{} samples at tick {ticks}", rx.count),
            None => println!("{} samples (no timestamp)", rx.count),
        }
    }

    println!("drained {total} samples; {}", device.run_statistics());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let (hw, device) = create_device(&cli).await?;

    match &cli.command {
        Command::Info => cmd_info(&device).await,
        Command::Tune { freq_hz, lo_offset } => {
            cmd_tune(&device, lo_offset.unwrap_or(cli.lo_offset), *freq_hz).await
        }
        Command::Gain { action } => match action {
            GainAction::Tx { action: GainOp::Get } => {
                println!("TX gain: {} dB", device.tx_gain().await?);
                Ok(())
            }
            GainAction::Tx {
                action: GainOp::Set { gain_db },
            } => {
                device.set_tx_gain(*gain_db).await?;
                println!("TX gain set to {gain_db} dB");
                Ok(())
            }
            GainAction::Rx { action: GainOp::Get } => {
                println!("RX gain: {} dB", device.rx_gain().await?);
                Ok(())
            }
            GainAction::Rx {
                action: GainOp::Set { gain_db },
            } => {
                device.set_rx_gain(*gain_db).await?;
                println!("RX gain set to {gain_db} dB");
                Ok(())
            }
        },
        Command::Clock { polls, interval_ms } => {
            cmd_clock(&device, *polls, Duration::from_millis(*interval_ms)).await
        }
        Command::Rx { frames, timeout_ms } => {
            cmd_rx(&hw, &device, *frames, Duration::from_millis(*timeout_ms)).await
        }
        Command::Soak {
            seconds,
            frame_len,
            phases,
        } => {
            let options = soak::SoakOptions {
                phase_seconds: *seconds,
                frame_len: *frame_len,
                phases: soak::parse_phases(phases)?,
            };
            soak::run(&device, &hw, options).await
        }
    }
}
