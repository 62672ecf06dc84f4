//! Gravity calculation for vehicles and satellites.
//!
//! Computes gravitational acceleration from every registered planet.
//! Gravity is one-way: bodies are pulled by planets, planets never feel
//! the vehicles or satellites.

use bevy::math::DVec2;

/// A point mass that pulls on dynamic bodies: (position, mass).
pub type GravitySource = (DVec2, f64);

/// Compute gravitational acceleration at a position from pre-fetched sources.
///
/// # Arguments
/// * `pos` - Position of the attracted body
/// * `sources` - (position, mass) pairs of the attracting planets
/// * `g` - Gravitational constant in simulation units
/// * `min_separation` - Pairs closer than this contribute nothing
///
/// # Returns
/// Acceleration vector in units/s²
#[inline]
pub fn compute_acceleration_from_sources(
    pos: DVec2,
    sources: &[GravitySource],
    g: f64,
    min_separation: f64,
) -> DVec2 {
    let mut acc = DVec2::ZERO;
    let min_r_squared = min_separation * min_separation;

    for &(body_pos, mass) in sources {
        let delta = body_pos - pos;
        let r_squared = delta.length_squared();

        // Avoid singularity when the body sits on a planet centre.
        if r_squared > min_r_squared {
            let r = r_squared.sqrt();
            // a = GM/r² toward the planet; delta/r is the unit vector
            acc += delta * (g * mass / (r_squared * r));
        }
    }

    acc
}

/// Gravity sources excluding one index, used for planets designated dynamic
/// so they do not attract themselves.
pub fn sources_except(sources: &[GravitySource], skip: usize) -> Vec<GravitySource> {
    sources
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .map(|(_, s)| *s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{G, MIN_SEPARATION};
    use approx::assert_relative_eq;

    #[test]
    fn test_acceleration_points_toward_planet() {
        let sources = [(DVec2::ZERO, 5.972e7)];
        let pos = DVec2::new(300.0, 0.0);

        let acc = compute_acceleration_from_sources(pos, &sources, G, MIN_SEPARATION);

        assert!(acc.x < 0.0, "Acceleration should point toward the planet");
        assert_relative_eq!(acc.y, 0.0, epsilon = 1e-12);

        let expected_mag = G * 5.972e7 / (300.0 * 300.0);
        assert_relative_eq!(acc.length(), expected_mag, max_relative = 1e-12);
    }

    #[test]
    fn test_acceleration_near_singularity() {
        let sources = [(DVec2::ZERO, 5.972e7)];
        let pos = DVec2::new(1e-6, 0.0);
        let acc = compute_acceleration_from_sources(pos, &sources, G, MIN_SEPARATION);

        assert!(acc.x.is_finite(), "Acceleration should be finite");
        assert!(acc.y.is_finite(), "Acceleration should be finite");
        assert_eq!(acc, DVec2::ZERO);
    }

    #[test]
    fn test_contributions_sum() {
        // Two equal planets on either side cancel out at the midpoint
        let sources = [(DVec2::new(-100.0, 0.0), 1.0e6), (DVec2::new(100.0, 0.0), 1.0e6)];
        let acc = compute_acceleration_from_sources(DVec2::ZERO, &sources, G, MIN_SEPARATION);
        assert_relative_eq!(acc.length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_sources_no_acceleration() {
        let acc = compute_acceleration_from_sources(DVec2::new(5.0, 5.0), &[], G, MIN_SEPARATION);
        assert_eq!(acc, DVec2::ZERO);
    }

    #[test]
    fn test_sources_except() {
        let sources = [(DVec2::ZERO, 1.0), (DVec2::X, 2.0), (DVec2::Y, 3.0)];
        let rest = sources_except(&sources, 1);
        assert_eq!(rest, vec![(DVec2::ZERO, 1.0), (DVec2::Y, 3.0)]);
    }
}
