//! Test utilities for flight simulation tests.
//!
//! Fixtures for orbits around a single test planet and assertions for the
//! physical invariants the integrator should keep.

use bevy::math::DVec2;

use crate::types::{BodyState, G};

/// Mass of the planet used by the fixtures.
pub const PLANET_MASS: f64 = 5.972e7;

/// Radius of the planet used by the fixtures.
pub const PLANET_RADIUS: f64 = 100.0;

/// Standard gravitational parameter of the fixture planet.
pub fn mu() -> f64 {
    G * PLANET_MASS
}

/// Fixtures for creating test orbital states around a planet at the origin.
pub mod fixtures {
    use super::*;

    /// Counter-clockwise circular orbit at distance `r` from the planet centre.
    ///
    /// Placed on the positive x-axis moving in +y.
    pub fn circular_orbit(r: f64) -> BodyState {
        let v = (mu() / r).sqrt();
        BodyState::new(DVec2::new(r, 0.0), DVec2::new(0.0, v), 1.0)
    }

    /// Ellipse starting at periapsis `r_p` on the positive x-axis.
    pub fn elliptical_orbit(r_p: f64, eccentricity: f64) -> BodyState {
        assert!(
            (0.0..1.0).contains(&eccentricity),
            "Eccentricity must be in [0, 1) for elliptical orbit"
        );
        let a = r_p / (1.0 - eccentricity);
        // Vis-viva
        let v = (mu() * (2.0 / r_p - 1.0 / a)).sqrt();
        BodyState::new(DVec2::new(r_p, 0.0), DVec2::new(0.0, v), 1.0)
    }

    /// 1.1x escape speed at distance `r`.
    pub fn escape_trajectory(r: f64) -> BodyState {
        let v = (2.0 * mu() / r).sqrt() * 1.1;
        BodyState::new(DVec2::new(r, 0.0), DVec2::new(0.0, v), 1.0)
    }
}

/// Assertions for verifying physical invariants.
pub mod assertions {
    use super::*;

    /// Specific orbital energy relative to the fixture planet: v²/2 - μ/r.
    pub fn orbital_energy(pos: DVec2, vel: DVec2) -> f64 {
        0.5 * vel.length_squared() - mu() / pos.length()
    }

    /// Specific angular momentum (z-component of r × v).
    pub fn angular_momentum(pos: DVec2, vel: DVec2) -> f64 {
        pos.perp_dot(vel)
    }

    /// Orbital period for a bound orbit with semi-major axis `a`.
    pub fn orbital_period(a: f64) -> f64 {
        std::f64::consts::TAU * (a.powi(3) / mu()).sqrt()
    }

    /// Assert relative drift between two values stays within `tolerance`.
    ///
    /// # Panics
    /// Panics if the drift exceeds tolerance.
    pub fn assert_conserved(label: &str, initial: f64, current: f64, tolerance: f64) {
        let drift = if initial.abs() > 1e-10 {
            ((current - initial) / initial).abs()
        } else {
            (current - initial).abs()
        };
        assert!(
            drift <= tolerance,
            "{label} not conserved: initial={initial:.6e}, current={current:.6e}, drift={drift:.6e}, tolerance={tolerance:.6e}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_orbit_is_bound() {
        let state = fixtures::circular_orbit(300.0);
        let energy = assertions::orbital_energy(state.pos, state.vel);
        // Circular: E = -μ / 2r
        assert_relative_eq!(energy, -mu() / 600.0, max_relative = 1e-12);
    }

    #[test]
    fn test_escape_trajectory_is_unbound() {
        let state = fixtures::escape_trajectory(300.0);
        assert!(assertions::orbital_energy(state.pos, state.vel) > 0.0);
    }

    #[test]
    fn test_elliptical_orbit_energy_matches_semi_major_axis() {
        let state = fixtures::elliptical_orbit(300.0, 0.5);
        let energy = assertions::orbital_energy(state.pos, state.vel);
        assert_relative_eq!(energy, -mu() / (2.0 * 600.0), max_relative = 1e-9);
    }
}
