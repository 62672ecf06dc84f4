//! Station keeping toward a captured orbit.
//!
//! A satellite remembers the specific energy and angular momentum of the
//! orbit it was flying when station keeping first engaged. Each tick it
//! computes the velocity that orbit would have at its current position and
//! nudges toward it, limited by its thruster authority and fuel.

use bevy::math::DVec2;

use crate::arena::PlanetId;
use crate::orbit::OrbitShape;
use crate::physics::PlanetSample;

/// The orbit a satellite tries to hold, relative to one planet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StationKeepingTarget {
    pub planet: PlanetId,
    pub specific_energy: f64,
    pub angular_momentum: f64,
}

impl StationKeepingTarget {
    /// Capture the orbit described by an absolute state around `planet`.
    pub fn capture(planet: &PlanetSample, position: DVec2, velocity: DVec2, g: f64) -> Option<Self> {
        let shape = OrbitShape::from_state(
            position - planet.position,
            velocity - planet.velocity,
            planet.mass,
            g,
        )?;
        Some(Self {
            planet: planet.id,
            specific_energy: shape.specific_energy,
            angular_momentum: shape.angular_momentum,
        })
    }

    /// Velocity (relative to the planet) the target orbit has at `rel_pos`.
    ///
    /// The radial component keeps the sign of the current radial motion so
    /// the satellite is steered along its own branch of the orbit. Outside
    /// the target's radial range the radial component is zero.
    pub fn desired_velocity(&self, rel_pos: DVec2, rel_vel: DVec2, mu: f64) -> Option<DVec2> {
        let r = rel_pos.length();
        if r.is_nan() || r <= 0.0 {
            return None;
        }

        let radial_hat = rel_pos / r;
        let tangential_hat = radial_hat.perp();

        let v_t = self.angular_momentum / r;
        let speed_sq = 2.0 * (self.specific_energy + mu / r);
        let v_r_sq = speed_sq - v_t * v_t;

        let v_r = if v_r_sq > 0.0 {
            let sign = if rel_vel.dot(radial_hat) < 0.0 { -1.0 } else { 1.0 };
            sign * v_r_sq.sqrt()
        } else {
            0.0
        };

        Some(radial_hat * v_r + tangential_hat * v_t)
    }
}

/// Thruster and fuel figures for station keeping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StationKeepingParams {
    /// Maximum correction acceleration at efficiency 1.0
    pub max_acceleration: f64,
    /// Fuel per unit of delta-v
    pub fuel_per_delta_v: f64,
    /// Velocity errors below this are ignored
    pub deadband: f64,
}

/// One tick of correction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    pub delta_v: DVec2,
    pub fuel_used: f64,
}

impl Correction {
    pub const NONE: Correction = Correction {
        delta_v: DVec2::ZERO,
        fuel_used: 0.0,
    };
}

/// Compute the correction for one tick.
///
/// Authority is `max_acceleration · efficiency · dt`; fuel cost is
/// proportional to the delta-v actually applied and never exceeds what is
/// available.
pub fn compute_correction(
    target: &StationKeepingTarget,
    planet: &PlanetSample,
    position: DVec2,
    velocity: DVec2,
    fuel_available: f64,
    efficiency: f64,
    params: &StationKeepingParams,
    g: f64,
    dt: f64,
) -> Correction {
    if dt <= 0.0 || fuel_available <= 0.0 || efficiency <= 0.0 {
        return Correction::NONE;
    }

    let rel_pos = position - planet.position;
    let rel_vel = velocity - planet.velocity;
    let Some(desired) = target.desired_velocity(rel_pos, rel_vel, g * planet.mass) else {
        return Correction::NONE;
    };

    let error = desired - rel_vel;
    if error.length() < params.deadband {
        return Correction::NONE;
    }

    let authority = params.max_acceleration * efficiency * dt;
    let mut delta_v = error.clamp_length_max(authority);
    let mut fuel_used = delta_v.length() * params.fuel_per_delta_v;

    if fuel_used > fuel_available {
        delta_v *= fuel_available / fuel_used;
        fuel_used = fuel_available;
    }

    Correction { delta_v, fuel_used }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::IdLike;
    use crate::types::G;
    use approx::assert_relative_eq;

    const PLANET_MASS: f64 = 5.972e7;

    fn planet() -> PlanetSample {
        PlanetSample {
            id: PlanetId::from_raw(0),
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            mass: PLANET_MASS,
            radius: 100.0,
        }
    }

    fn params() -> StationKeepingParams {
        StationKeepingParams {
            max_acceleration: 2.0,
            fuel_per_delta_v: 0.05,
            deadband: 0.01,
        }
    }

    fn circular(r: f64) -> (DVec2, DVec2) {
        (DVec2::new(r, 0.0), DVec2::new(0.0, (G * PLANET_MASS / r).sqrt()))
    }

    #[test]
    fn test_on_target_needs_no_fuel() {
        let (pos, vel) = circular(300.0);
        let target = StationKeepingTarget::capture(&planet(), pos, vel, G).unwrap();
        let correction = compute_correction(&target, &planet(), pos, vel, 10.0, 1.0, &params(), G, 1.0 / 60.0);
        assert_eq!(correction, Correction::NONE);
    }

    #[test]
    fn test_kick_is_cancelled() {
        let (pos, vel) = circular(300.0);
        let target = StationKeepingTarget::capture(&planet(), pos, vel, G).unwrap();

        let kicked = vel + DVec2::new(1.0, 0.0);
        let correction = compute_correction(&target, &planet(), pos, kicked, 10.0, 1.0, &params(), G, 1.0);

        let corrected = kicked + correction.delta_v;
        assert_relative_eq!(corrected.x, vel.x, epsilon = 1e-3);
        assert_relative_eq!(corrected.y, vel.y, epsilon = 1e-3);
        assert_relative_eq!(correction.fuel_used, correction.delta_v.length() * 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_authority_scales_with_efficiency() {
        let (pos, vel) = circular(300.0);
        let target = StationKeepingTarget::capture(&planet(), pos, vel, G).unwrap();
        let kicked = vel + DVec2::new(5.0, 0.0);
        let dt = 0.1;

        let full = compute_correction(&target, &planet(), pos, kicked, 10.0, 1.0, &params(), G, dt);
        let half = compute_correction(&target, &planet(), pos, kicked, 10.0, 0.5, &params(), G, dt);

        assert_relative_eq!(full.delta_v.length(), 2.0 * dt, max_relative = 1e-9);
        assert_relative_eq!(half.delta_v.length(), 1.0 * dt, max_relative = 1e-9);
    }

    #[test]
    fn test_fuel_limited() {
        let (pos, vel) = circular(300.0);
        let target = StationKeepingTarget::capture(&planet(), pos, vel, G).unwrap();
        let kicked = vel + DVec2::new(1.0, 0.0);

        let correction = compute_correction(&target, &planet(), pos, kicked, 0.01, 1.0, &params(), G, 1.0);
        assert_relative_eq!(correction.fuel_used, 0.01);
        assert_relative_eq!(correction.delta_v.length(), 0.01 / 0.05, max_relative = 1e-9);
    }

    #[test]
    fn test_no_fuel_no_correction() {
        let (pos, vel) = circular(300.0);
        let target = StationKeepingTarget::capture(&planet(), pos, vel, G).unwrap();
        let correction =
            compute_correction(&target, &planet(), pos, vel * 1.2, 0.0, 1.0, &params(), G, 1.0);
        assert_eq!(correction, Correction::NONE);
    }
}
