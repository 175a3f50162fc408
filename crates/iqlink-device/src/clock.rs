//! Clock-discipline evaluation over named hardware lock sensors.
//!
//! External references and GPS-disciplined oscillators expose lock state
//! through hardware sensors. Each check polls the sensors at call time; lock
//! state is never cached, so a reference that drops lock is visible on the
//! very next health poll.

use iqlink_core::error::{Error, Result};
use iqlink_core::hardware::Hardware;
use iqlink_core::types::ClockSource;

/// Sensor reporting lock to the external 10 MHz reference.
pub const REF_LOCK_SENSOR: &str = "ref_locked";

/// Sensor reporting GPS lock on a GPS-disciplined oscillator.
pub const GPS_LOCK_SENSOR: &str = "gps_locked";

/// Whether the given clock source is currently usable.
///
/// - `Internal`: trivially `true`, no hardware query.
/// - `External`: `true` iff the `ref_locked` sensor reads true.
/// - `Gps`: `true` iff both `gps_locked` and `ref_locked` read true.
///
/// A sensor the hardware does not expose counts as *not* locked: an
/// unverifiable reference must not be reported healthy. Other hardware
/// errors propagate.
pub async fn clock_source_ok(hardware: &dyn Hardware, source: ClockSource) -> Result<bool> {
    match source {
        ClockSource::Internal => Ok(true),
        ClockSource::External => lock_sensor(hardware, REF_LOCK_SENSOR).await,
        ClockSource::Gps => {
            let gps = lock_sensor(hardware, GPS_LOCK_SENSOR).await?;
            let reference = lock_sensor(hardware, REF_LOCK_SENSOR).await?;
            Ok(gps && reference)
        }
    }
}

/// Read one boolean lock sensor.
///
/// Missing sensors and non-boolean readings both map to `false`.
async fn lock_sensor(hardware: &dyn Hardware, name: &str) -> Result<bool> {
    match hardware.query_sensor(name).await {
        Ok(value) => Ok(value.as_bool().unwrap_or(false)),
        Err(Error::Unsupported(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
