//! Scenario Runner - triggered behavior-tree scenarios for simulated driving tests
//!
//! Core modules:
//! - `sim`: Deterministic world model (geometry, placement, kinematic reference world)
//! - `behavior`: Behavior nodes, composites and trigger conditions
//! - `criteria`: Independently sampled pass/fail test criteria
//! - `scenario`: Scenario lifecycle, concrete scenarios and the final report
//! - `settings`: Run settings (timeout, tick rate, criteria toggle)

pub mod behavior;
pub mod criteria;
pub mod error;
pub mod scenario;
pub mod settings;
pub mod sim;

pub use error::{Result, ScenarioError};
pub use scenario::{Scenario, ScenarioDefinition, ScenarioReport};
pub use settings::{Settings, SimRate};

use glam::Vec3;

use sim::Rotation;

/// Engine configuration constants
pub mod consts {
    /// Default fixed simulation timestep (20 Hz)
    pub const SIM_DT: f32 = 1.0 / 20.0;

    /// Deceleration at full brake (units/s²)
    pub const MAX_BRAKE_DECEL: f32 = 8.0;
    /// Speed at or below which an actor counts as stopped
    pub const STOP_SPEED_TOLERANCE: f32 = 0.01;
    /// Closing speeds at or below this never arrive
    pub const MIN_CLOSING_SPEED: f32 = 1e-3;

    /// Bounding radii used for contact detection
    pub const VEHICLE_RADIUS: f32 = 2.0;
    pub const WALKER_RADIUS: f32 = 0.5;
    pub const PROP_RADIUS: f32 = 1.0;

    /// Tolerance when converting a duration to whole ticks
    pub const TIME_EPSILON: f32 = 1e-4;
}

/// Whole ticks of `dt` needed to cover `duration`
///
/// Durations are compared in ticks rather than summed seconds, so long
/// runs never drift. A non-positive `dt` never covers anything.
pub fn ticks_for(duration: f32, dt: f32) -> u64 {
    if dt <= 0.0 || !dt.is_finite() {
        return u64::MAX;
    }
    let ticks = (f64::from(duration) - f64::from(consts::TIME_EPSILON)) / f64::from(dt);
    // Saturating cast: negative and NaN become 0
    ticks.ceil() as u64
}

/// Normalized yaw to [-180, 180) degrees
#[inline]
pub fn normalize_yaw(yaw: f32) -> f32 {
    let wrapped = (yaw + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Unit vector an actor with this rotation is facing
#[inline]
pub fn forward_vector(rotation: &Rotation) -> Vec3 {
    let (pitch, yaw) = (rotation.pitch.to_radians(), rotation.yaw.to_radians());
    Vec3::new(pitch.cos() * yaw.cos(), pitch.cos() * yaw.sin(), pitch.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_yaw() {
        assert_eq!(normalize_yaw(0.0), 0.0);
        assert_eq!(normalize_yaw(270.0), -90.0);
        assert_eq!(normalize_yaw(180.0), -180.0);
        assert_eq!(normalize_yaw(-180.0), -180.0);
        assert_eq!(normalize_yaw(720.0 + 45.0), 45.0);
        assert!((-180.0..180.0).contains(&normalize_yaw(-1e-7)));
    }

    #[test]
    fn test_ticks_for() {
        assert_eq!(ticks_for(60.0, consts::SIM_DT), 1200);
        assert_eq!(ticks_for(10.0, consts::SIM_DT), 200);
        assert_eq!(ticks_for(0.07, consts::SIM_DT), 2);
        assert_eq!(ticks_for(1.5e6, consts::SIM_DT), 30_000_000);
        assert_eq!(ticks_for(0.0, consts::SIM_DT), 0);
        assert_eq!(ticks_for(-1.0, consts::SIM_DT), 0);
        assert_eq!(ticks_for(1.0, 0.0), u64::MAX);
    }

    #[test]
    fn test_forward_vector() {
        let east = forward_vector(&Rotation::from_yaw(0.0));
        assert!((east - Vec3::X).length() < 1e-6);

        let north = forward_vector(&Rotation::from_yaw(90.0));
        assert!((north - Vec3::Y).length() < 1e-6);

        let up = forward_vector(&Rotation { pitch: 90.0, yaw: 0.0, roll: 0.0 });
        assert!((up - Vec3::Z).length() < 1e-6);
    }
}
