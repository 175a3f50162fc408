// Soak subcommand -- phased validation harness for the frame transport
// engine. Runs paced transmit, transient fault injection, full-duplex
// transfer, and fatal-latch phases against the mock backend and checks the
// run statistics after each one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use iqlink::mock::MockHardware;
use iqlink::{
    Complex32, DeviceBuilder, Error, Hardware, SampleFrame, SdrDevice, StreamDevice, WriteStatus,
};

// ---------------------------------------------------------------------------
// CLI options (passed from main.rs)
// ---------------------------------------------------------------------------

pub struct SoakOptions {
    pub phase_seconds: u64,
    pub frame_len: usize,
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pacing,
    Faults,
    Duplex,
    Fatal,
}

const ALL_PHASES: &[Phase] = &[Phase::Pacing, Phase::Faults, Phase::Duplex, Phase::Fatal];

pub fn parse_phases(s: &str) -> Result<Vec<Phase>> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(ALL_PHASES.to_vec());
    }
    let mut phases = Vec::new();
    for part in s.split(',') {
        let p = match part.trim().to_lowercase().as_str() {
            "pacing" => Phase::Pacing,
            "faults" => Phase::Faults,
            "duplex" => Phase::Duplex,
            "fatal" => Phase::Fatal,
            other => bail!("unknown phase '{other}'. Valid: pacing, faults, duplex, fatal, all"),
        };
        phases.push(p);
    }
    Ok(phases)
}

fn phase_label(p: Phase) -> &'static str {
    match p {
        Phase::Pacing => "pacing",
        Phase::Faults => "faults",
        Phase::Duplex => "duplex",
        Phase::Fatal => "fatal",
    }
}

// ---------------------------------------------------------------------------
// Frame generation
// ---------------------------------------------------------------------------

/// Gaussian-ish noise payload; the engine never inspects sample values but
/// a varying payload keeps the demo honest.
fn noise_frame(rng: &mut StdRng, len: usize) -> Vec<Complex32> {
    (0..len)
        .map(|_| Complex32::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)))
        .collect()
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Paced transmit at the configured sample rate. Each frame is stamped one
/// frame-length after the previous one and handed over at roughly real-time
/// cadence; afterwards no late or dropped frames may have accumulated.
async fn phase_pacing(device: &StreamDevice, options: &SoakOptions) -> Result<()> {
    let rate = device.config().sample_rate_hz;
    let frame_period = Duration::from_secs_f64(options.frame_len as f64 / rate);
    let deadline = Instant::now() + Duration::from_secs(options.phase_seconds);

    let mut rng = StdRng::seed_from_u64(1);
    let before = device.run_statistics();
    let mut ticks = (rate as u64).max(1);
    let mut sent = 0u64;

    let mut pacer = tokio::time::interval(frame_period);
    while Instant::now() < deadline {
        pacer.tick().await;
        let samples = noise_frame(&mut rng, options.frame_len);
        device
            .transmit_frame(SampleFrame::at_ticks(&samples, ticks)?)
            .await?;
        ticks += options.frame_len as u64;
        sent += 1;
    }

    let after = device.run_statistics();
    println!(
        "  sent {sent} frames at {:.1} fps",
        sent as f64 / options.phase_seconds as f64
    );
    if after.late_packets != before.late_packets {
        bail!("in-order paced transmit must not produce late frames");
    }
    if after.frames_transmitted - before.frames_transmitted != sent {
        bail!("frame counter does not match frames sent");
    }
    Ok(())
}

/// Inject underflows, FIFO stalls, and stale timestamps; every event must be
/// counted, none may kill the stream.
async fn phase_faults(
    device: &StreamDevice,
    hw: &MockHardware,
    options: &SoakOptions,
) -> Result<()> {
    const UNDERFLOWS: u64 = 3;
    const OVERFLOWS: u64 = 2;
    const LATE: u64 = 2;

    let mut rng = StdRng::seed_from_u64(2);
    let samples = noise_frame(&mut rng, options.frame_len);
    let before = device.run_statistics();

    for _ in 0..UNDERFLOWS {
        hw.push_write_status(WriteStatus::Underflow);
    }
    for _ in 0..OVERFLOWS {
        hw.push_write_status(WriteStatus::Timeout);
    }

    let mut ticks = 10_000_000u64;
    for _ in 0..(UNDERFLOWS + OVERFLOWS + 4) {
        device
            .transmit_frame(SampleFrame::at_ticks(&samples, ticks)?)
            .await?;
        ticks += options.frame_len as u64;
    }
    for _ in 0..LATE {
        // Well behind the stream position: dropped and counted, not an error.
        device
            .transmit_frame(SampleFrame::at_ticks(&samples, 1)?)
            .await?;
    }

    let after = device.run_statistics();
    println!(
        "  injected {UNDERFLOWS} underflows, {OVERFLOWS} overflows, {LATE} late; stats now {after}"
    );
    if after.underflows - before.underflows != UNDERFLOWS {
        bail!("underflow count mismatch");
    }
    if after.overflows - before.overflows != OVERFLOWS {
        bail!("overflow count mismatch");
    }
    if after.late_packets - before.late_packets != LATE {
        bail!("late frame count mismatch");
    }
    Ok(())
}

/// Concurrent transmit and receive on one device. The two paths must not
/// serialize against each other or corrupt each other's accounting.
async fn phase_duplex(
    device: &StreamDevice,
    hw: &MockHardware,
    options: &SoakOptions,
) -> Result<()> {
    const RX_BLOCKS: u64 = 64;
    const RX_BLOCK_LEN: usize = 1024;

    let mut rng = StdRng::seed_from_u64(3);
    for n in 0..RX_BLOCKS {
        hw.push_rx_block(
            noise_frame(&mut rng, RX_BLOCK_LEN),
            n * RX_BLOCK_LEN as u64,
        );
    }

    let before = device.run_statistics();
    let frames = 64u64;
    let frame_len = options.frame_len;

    // Both halves run against the same &StreamDevice.
    let tx = async {
        let mut rng = StdRng::seed_from_u64(4);
        let mut ticks = 20_000_000u64;
        for _ in 0..frames {
            let samples = noise_frame(&mut rng, frame_len);
            device
                .transmit_frame(SampleFrame::at_ticks(&samples, ticks)?)
                .await?;
            ticks += frame_len as u64;
        }
        Ok::<_, Error>(())
    };
    let rx = async {
        let mut buf = vec![Complex32::new(0.0, 0.0); RX_BLOCK_LEN];
        let mut total = 0usize;
        for _ in 0..RX_BLOCKS {
            let frame = device.receive_frame(&mut buf, Duration::from_millis(5)).await?;
            total += frame.count;
        }
        Ok::<_, Error>(total)
    };

    let (tx_result, rx_result) = tokio::join!(tx, rx);
    tx_result.context("duplex transmit failed")?;
    let received = rx_result.context("duplex receive failed")?;

    let after = device.run_statistics();
    println!("  {frames} frames out, {received} samples in");
    if after.frames_transmitted - before.frames_transmitted != frames {
        bail!("duplex frame counter mismatch");
    }
    if received != RX_BLOCKS as usize * RX_BLOCK_LEN {
        bail!("duplex receive drained {received} samples, expected all queued blocks");
    }
    Ok(())
}

/// Fatal fault latch. Built on a fresh device so the shared one stays usable
/// for any phases that follow.
async fn phase_fatal(device: &StreamDevice, options: &SoakOptions) -> Result<()> {
    let hw = Arc::new(MockHardware::new("soak-fatal"));
    let victim = DeviceBuilder::new(device.config())
        .build_with_hardware(Arc::clone(&hw) as Arc<dyn Hardware>)
        .await
        .context("failed to build fatal-phase device")?;

    let mut rng = StdRng::seed_from_u64(5);
    let samples = noise_frame(&mut rng, options.frame_len);

    hw.fail_tx("injected stream abort");
    let first = victim.transmit_frame(SampleFrame::now(&samples)?).await;
    if !matches!(first, Err(Error::TransmitFatal { .. })) {
        bail!("expected a fatal transmit error, got {first:?}");
    }

    // Every later operation must fail fast with the latch error.
    for _ in 0..3 {
        let result = victim.transmit_frame(SampleFrame::now(&samples)?).await;
        if !matches!(result, Err(Error::DeviceFatal { .. })) {
            bail!("latched device accepted a call: {result:?}");
        }
    }
    let tune = victim.tune(0.0, 145_000_000.0).await;
    if !matches!(tune, Err(Error::DeviceFatal { .. })) {
        bail!("latched device accepted a tune: {tune:?}");
    }

    println!("  latch held across transmit and control calls");
    Ok(())
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub async fn run(device: &StreamDevice, hw: &MockHardware, options: SoakOptions) -> Result<()> {
    println!(
        "Soak: {} phase(s), {} s each, {} samples/frame on {}",
        options.phases.len(),
        options.phase_seconds,
        options.frame_len,
        device.device_name()
    );

    let mut failures = 0u32;
    for &phase in &options.phases {
        println!("[{}]", phase_label(phase));
        let started = Instant::now();
        let result = match phase {
            Phase::Pacing => phase_pacing(device, &options).await,
            Phase::Faults => phase_faults(device, hw, &options).await,
            Phase::Duplex => phase_duplex(device, hw, &options).await,
            Phase::Fatal => phase_fatal(device, &options).await,
        };
        match result {
            Ok(()) => println!("  PASS ({:.2} s)", started.elapsed().as_secs_f64()),
            Err(e) => {
                println!("  FAIL: {e:#}");
                failures += 1;
            }
        }
    }

    println!();
    println!("Final statistics: {}", device.run_statistics());
    if failures > 0 {
        bail!("{failures} soak phase(s) failed");
    }
    Ok(())
}
