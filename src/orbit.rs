//! Two-body orbital analytics.
//!
//! Pure functions over an instantaneous state relative to one planet. They
//! never mutate anything and nothing here is cached; telemetry consumers
//! call them whenever they need a fresh value.

use bevy::math::DVec2;

/// Result of an apsis query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Apsis {
    /// Distance from the planet centre.
    Distance(f64),
    /// The trajectory escapes (energy ≥ 0) or is undefined, so there is no
    /// finite value to report.
    Unbound,
}

impl Apsis {
    /// The distance, if one exists.
    pub fn distance(self) -> Option<f64> {
        match self {
            Apsis::Distance(d) => Some(d),
            Apsis::Unbound => None,
        }
    }

    pub fn is_unbound(self) -> bool {
        matches!(self, Apsis::Unbound)
    }
}

/// Conic parameters derived from a state vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitShape {
    /// ε = v²/2 − μ/r
    pub specific_energy: f64,
    /// h = r × v (z component, positive for counter-clockwise motion)
    pub angular_momentum: f64,
    /// Eccentricity (0 circular, <1 ellipse, 1 parabola, >1 hyperbola)
    pub eccentricity: f64,
    /// Standard gravitational parameter μ = G·M
    pub mu: f64,
}

impl OrbitShape {
    /// Derive the conic from position and velocity relative to the planet.
    ///
    /// Returns `None` when no conic exists: non-positive or non-finite mass,
    /// a body sitting exactly at the centre, or non-finite state.
    pub fn from_state(position: DVec2, velocity: DVec2, planet_mass: f64, g: f64) -> Option<Self> {
        let mu = g * planet_mass;
        let r = position.length();
        if !mu.is_finite() || mu <= 0.0 || !r.is_finite() || r <= 0.0 || !velocity.is_finite() {
            return None;
        }

        let specific_energy = 0.5 * velocity.length_squared() - mu / r;
        let angular_momentum = position.perp_dot(velocity);

        // e² = 1 + 2εh²/μ²; rounding can push it a hair below zero
        let e_squared = 1.0 + 2.0 * specific_energy * angular_momentum * angular_momentum / (mu * mu);
        let eccentricity = e_squared.max(0.0).sqrt();

        Some(Self {
            specific_energy,
            angular_momentum,
            eccentricity,
            mu,
        })
    }

    /// Bound orbits have negative specific energy.
    pub fn is_bound(&self) -> bool {
        self.specific_energy < 0.0
    }

    /// Semi-major axis for bound orbits: a = −μ / 2ε.
    pub fn semi_major_axis(&self) -> Option<f64> {
        self.is_bound().then(|| -self.mu / (2.0 * self.specific_energy))
    }

    /// Farthest distance from the planet centre.
    pub fn apoapsis(&self) -> Apsis {
        match self.semi_major_axis() {
            Some(a) => Apsis::Distance(a * (1.0 + self.eccentricity.min(1.0))),
            None => Apsis::Unbound,
        }
    }

    /// Nearest distance from the planet centre.
    ///
    /// Defined for open trajectories as well: a hyperbola still has a
    /// closest approach.
    pub fn periapsis(&self) -> Apsis {
        let distance = match self.semi_major_axis() {
            Some(a) => a * (1.0 - self.eccentricity.min(1.0)),
            None => {
                let h = self.angular_momentum;
                h * h / (self.mu * (1.0 + self.eccentricity))
            }
        };
        Apsis::Distance(distance.max(0.0))
    }
}

/// Apoapsis of the orbit described by `position`/`velocity` relative to a
/// planet of `planet_mass`.
///
/// Reports [`Apsis::Unbound`] for parabolic and hyperbolic trajectories.
pub fn apoapsis(position: DVec2, velocity: DVec2, planet_mass: f64, g: f64) -> Apsis {
    OrbitShape::from_state(position, velocity, planet_mass, g)
        .map_or(Apsis::Unbound, |shape| shape.apoapsis())
}

/// Periapsis of the orbit described by `position`/`velocity` relative to a
/// planet of `planet_mass`. Never negative and never above the apoapsis.
pub fn periapsis(position: DVec2, velocity: DVec2, planet_mass: f64, g: f64) -> Apsis {
    OrbitShape::from_state(position, velocity, planet_mass, g)
        .map_or(Apsis::Unbound, |shape| shape.periapsis())
}

/// Result of a closest-planet lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPlanet<K> {
    /// Caller-supplied key of the winning planet
    pub key: K,
    /// Distance from the query point to the planet centre
    pub distance: f64,
}

/// Find the planet whose centre is nearest to `position`.
///
/// Linear scan in iteration order; on equal distances the earlier planet
/// wins. Returns `None` for an empty input.
pub fn find_closest_planet<K, I>(position: DVec2, planets: I) -> Option<ClosestPlanet<K>>
where
    I: IntoIterator<Item = (K, DVec2)>,
{
    let mut closest: Option<ClosestPlanet<K>> = None;

    for (key, planet_pos) in planets {
        let distance = (planet_pos - position).length();
        let better = match &closest {
            Some(best) => distance < best.distance,
            None => true,
        };
        if better {
            closest = Some(ClosestPlanet { key, distance });
        }
    }

    closest
}
