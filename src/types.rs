//! Core physics types and constants for the flight simulation.
//!
//! All quantities are in simulation units: distances in world units,
//! time in seconds, mass in arbitrary mass units. The gravitational
//! constant is scaled so that planets a few hundred units across produce
//! orbits with periods of tens of seconds.

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

/// Gravitational constant in simulation units.
pub const G: f64 = 6.674e-2;

/// Separation below which a body/planet pair contributes no acceleration.
pub const MIN_SEPARATION: f64 = 1e-3;

/// Degrees to radians conversion factor
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians to degrees conversion factor
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Nominal frame time of the fixed simulation loop (seconds).
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Position/velocity pair, used wherever a body's kinematic state is passed
/// around without its identity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyState {
    /// Position in world units
    pub pos: DVec2,
    /// Velocity in world units per second
    pub vel: DVec2,
    /// Mass in simulation mass units
    pub mass: f64,
}

impl BodyState {
    /// Create a new body state
    pub fn new(pos: DVec2, vel: DVec2, mass: f64) -> Self {
        Self { pos, vel, mass }
    }

    /// Speed (velocity magnitude)
    pub fn speed(&self) -> f64 {
        self.vel.length()
    }
}

/// Simulation clock.
///
/// `elapsed` only advances through the session tick, so it always equals the
/// sum of the timesteps the physics actually integrated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationTime {
    /// Simulated seconds since the session began
    pub elapsed: f64,
    /// Time scale multiplier (1.0 = real time)
    pub scale: f64,
    /// Whether simulation is paused
    pub paused: bool,
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            scale: 1.0,
            paused: false,
        }
    }
}

impl SimulationTime {
    /// Create a clock that resumes at the given elapsed time.
    pub fn resumed_at(elapsed: f64) -> Self {
        Self {
            elapsed,
            ..Default::default()
        }
    }

    /// Scaled simulation step for a real-time frame delta.
    ///
    /// Returns zero while paused.
    pub fn scaled_step(&self, real_dt: f64) -> f64 {
        if self.paused {
            return 0.0;
        }
        (real_dt * self.scale).max(0.0)
    }
}

/// Camera placement, persisted with the session so a reload frames the
/// same view. The core never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// World-space point at the centre of the view
    pub center: [f64; 2],
    /// Orthographic zoom factor
    pub zoom: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            zoom: 1.0,
        }
    }
}

/// Unit vector for a heading in degrees.
///
/// 0° points along +y and angles grow clockwise, matching screen-space
/// rotation of the vehicle sprites.
#[inline]
pub fn heading_vector(rotation_deg: f64) -> DVec2 {
    let theta = rotation_deg * DEG_TO_RAD;
    DVec2::new(theta.sin(), theta.cos())
}

/// Wrap an angle in degrees into [0, 360).
#[inline]
pub fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}
