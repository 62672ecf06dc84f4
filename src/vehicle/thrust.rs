//! Thrust and fuel-burn calculations for player vehicles.
//!
//! A burn is computed per tick from the commanded level, the remaining fuel
//! and the vehicle's engine figures. When the tank cannot cover the full
//! request the delivered thrust is scaled down by the same fraction.

use bevy::math::DVec2;

use crate::types::heading_vector;

/// Outcome of one tick of engine operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Burn {
    /// Fuel consumed this tick
    pub fuel_used: f64,
    /// Velocity change delivered this tick
    pub delta_v: DVec2,
    /// Fraction of the commanded thrust actually delivered, in [0, 1]
    pub delivered: f64,
}

impl Burn {
    pub const NONE: Burn = Burn {
        fuel_used: 0.0,
        delta_v: DVec2::ZERO,
        delivered: 0.0,
    };
}

/// Fuel required for a burn: `|level| · burn_rate · dt`.
#[inline]
pub fn fuel_required(level: f64, burn_rate: f64, dt: f64) -> f64 {
    level.abs() * burn_rate.max(0.0) * dt.max(0.0)
}

/// Engine acceleration magnitude: F / m.
#[inline]
pub fn thrust_acceleration(max_thrust: f64, level: f64, mass: f64) -> f64 {
    if mass <= 0.0 {
        return 0.0;
    }
    max_thrust * level / mass
}

/// Compute one tick of engine operation.
///
/// # Arguments
/// * `level` - Signed thrust level in [-1, 1]; negative thrusts backwards
/// * `rotation_deg` - Vehicle heading
/// * `fuel_available` - Fuel in the tank
/// * `burn_rate` - Fuel per second at full thrust
/// * `max_thrust` - Force at full thrust
/// * `mass` - Current vehicle mass
/// * `dt` - Timestep
pub fn compute_burn(
    level: f64,
    rotation_deg: f64,
    fuel_available: f64,
    burn_rate: f64,
    max_thrust: f64,
    mass: f64,
    dt: f64,
) -> Burn {
    if level == 0.0 || dt <= 0.0 || fuel_available <= 0.0 {
        return Burn::NONE;
    }

    let required = fuel_required(level, burn_rate, dt);
    let (fuel_used, delivered) = if required <= fuel_available {
        (required, 1.0)
    } else {
        (fuel_available, fuel_available / required)
    };

    let acc = thrust_acceleration(max_thrust, level, mass) * delivered;
    Burn {
        fuel_used,
        delta_v: heading_vector(rotation_deg) * acc * dt,
        delivered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_full_burn_consumes_exact_fuel() {
        let burn = compute_burn(1.0, 0.0, 100.0, 10.0, 500.0, 50.0, 0.25);
        assert_relative_eq!(burn.fuel_used, 2.5, epsilon = EPSILON);
        assert_relative_eq!(burn.delivered, 1.0);
        // a = 500 / 50 = 10, dv = 10 * 0.25 along +y
        assert_relative_eq!(burn.delta_v.y, 2.5, epsilon = EPSILON);
        assert_relative_eq!(burn.delta_v.x, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_reverse_thrust() {
        let burn = compute_burn(-0.5, 90.0, 100.0, 10.0, 500.0, 50.0, 1.0);
        assert_relative_eq!(burn.fuel_used, 5.0, epsilon = EPSILON);
        assert!(burn.delta_v.x < 0.0, "negative level pushes backwards");
    }

    #[test]
    fn test_partial_burn_when_fuel_short() {
        let burn = compute_burn(1.0, 0.0, 1.0, 10.0, 500.0, 50.0, 0.5);
        assert_relative_eq!(burn.fuel_used, 1.0);
        assert_relative_eq!(burn.delivered, 0.2, epsilon = EPSILON);
        assert_relative_eq!(burn.delta_v.y, 10.0 * 0.5 * 0.2, epsilon = EPSILON);
    }

    #[test]
    fn test_empty_tank_no_thrust() {
        assert_eq!(compute_burn(1.0, 0.0, 0.0, 10.0, 500.0, 50.0, 0.5), Burn::NONE);
    }

    #[test]
    fn test_zero_mass_no_acceleration() {
        assert_eq!(thrust_acceleration(500.0, 1.0, 0.0), 0.0);
    }
}
