//! Fixed-step integration for dynamic bodies.
//!
//! Uses semi-implicit (symplectic) Euler:
//!
//! ```text
//! v_{n+1} = v_n + a(x_n) * dt
//! x_{n+1} = x_n + v_{n+1} * dt
//! ```
//!
//! It is first order but symplectic, so orbital energy oscillates around its
//! true value instead of drifting away over long runs.

use bevy::math::DVec2;

use crate::types::{G, MIN_SEPARATION};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the gravity integrator.
#[derive(Clone, Debug, PartialEq)]
pub struct GravityConfig {
    /// Gravitational constant in simulation units. Default: 6.674e-2.
    pub gravitational_constant: f64,
    /// Pairs closer than this are skipped. Default: 1e-3.
    pub min_separation: f64,
    /// Push dynamic bodies out of planets they penetrate. Default: true.
    pub resolve_surface_contact: bool,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: G,
            min_separation: MIN_SEPARATION,
            resolve_surface_contact: true,
        }
    }
}

// =============================================================================
// Integrated bodies
// =============================================================================

/// Anything the gravity simulator moves.
///
/// Implemented by vehicles and satellites so the integration loop is shared.
pub trait GravityAffected {
    fn position(&self) -> DVec2;
    fn velocity(&self) -> DVec2;
    fn mass(&self) -> f64;
    fn set_kinematics(&mut self, position: DVec2, velocity: DVec2);
}

/// One semi-implicit Euler step.
///
/// Returns the new (position, velocity).
#[inline]
pub fn symplectic_euler_step(pos: DVec2, vel: DVec2, acc: DVec2, dt: f64) -> (DVec2, DVec2) {
    let vel_new = vel + acc * dt;
    let pos_new = pos + vel_new * dt;
    (pos_new, vel_new)
}

/// Advance a body by one step under the given acceleration.
pub fn integrate_body<B: GravityAffected + ?Sized>(body: &mut B, acc: DVec2, dt: f64) {
    let (pos, vel) = symplectic_euler_step(body.position(), body.velocity(), acc, dt);
    body.set_kinematics(pos, vel);
}

/// Planet surface used for contact resolution: (centre, velocity, radius).
pub type Surface = (DVec2, DVec2, f64);

/// Keep a body outside every planet surface.
///
/// A body found inside a planet is moved radially onto the surface and the
/// inward component of its velocity relative to that planet is removed.
/// Returns `true` if any correction was applied.
pub fn resolve_surface_contact<B: GravityAffected + ?Sized>(body: &mut B, surfaces: &[Surface]) -> bool {
    let mut touched = false;

    for &(centre, planet_vel, radius) in surfaces {
        if radius <= 0.0 {
            continue;
        }
        let offset = body.position() - centre;
        let distance = offset.length();
        if distance >= radius {
            continue;
        }

        // Dead centre has no defined normal; pick +y.
        let normal = if distance > 1e-12 { offset / distance } else { DVec2::Y };
        let rel_vel = body.velocity() - planet_vel;
        let inward = rel_vel.dot(normal);
        let vel = if inward < 0.0 {
            body.velocity() - normal * inward
        } else {
            body.velocity()
        };

        body.set_kinematics(centre + normal * radius, vel);
        touched = true;
    }

    touched
}

// =============================================================================
// Tests
// =============================================================================
