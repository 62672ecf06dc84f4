//! Planets and moons.

use bevy::color::Srgba;
use bevy::math::DVec2;

use crate::arena::PlanetId;

/// How a planet moves each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlanetMotion {
    /// Immovable gravity anchor.
    #[default]
    Fixed,
    /// Circular orbit around another planet, resolved by id every tick.
    /// The parent does not own the child; a missing parent freezes it.
    Scripted { parent: PlanetId },
    /// Integrated under the gravity of every other registered planet.
    Dynamic,
}

/// A planet or moon.
///
/// Mass and radius are fixed at construction; only a snapshot restore builds
/// a body with different values.
#[derive(Clone, Debug, PartialEq)]
pub struct CelestialBody {
    pub position: DVec2,
    pub velocity: DVec2,
    mass: f64,
    radius: f64,
    /// Display only.
    pub color: Srgba,
    pub motion: PlanetMotion,
    /// Marks the home planet vehicles spawn on.
    pub is_main_planet: bool,
}

impl CelestialBody {
    /// Create a fixed planet at rest.
    ///
    /// Mass is not validated here; registration with the
    /// [`GravitySimulator`](crate::physics::GravitySimulator) rejects
    /// non-positive masses.
    pub fn new(position: DVec2, mass: f64, radius: f64, color: Srgba) -> Self {
        Self {
            position,
            velocity: DVec2::ZERO,
            mass,
            radius: radius.max(0.0),
            color,
            motion: PlanetMotion::Fixed,
            is_main_planet: false,
        }
    }

    /// Builder: mark as the home planet.
    pub fn main_planet(mut self) -> Self {
        self.is_main_planet = true;
        self
    }

    /// Builder: follow a scripted circular orbit around `parent`.
    pub fn orbiting(mut self, parent: PlanetId) -> Self {
        self.motion = PlanetMotion::Scripted { parent };
        self
    }

    /// Builder: integrate under the other planets' gravity.
    pub fn dynamic(mut self, velocity: DVec2) -> Self {
        self.motion = PlanetMotion::Dynamic;
        self.velocity = velocity;
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Orbital parent, if the planet follows a scripted orbit.
    pub fn orbital_parent(&self) -> Option<PlanetId> {
        match self.motion {
            PlanetMotion::Scripted { parent } => Some(parent),
            _ => None,
        }
    }

    /// Distance from the planet surface (negative when inside).
    pub fn altitude_of(&self, point: DVec2) -> f64 {
        (point - self.position).length() - self.radius
    }
}

/// Advance a body on a circular orbit around a parent.
///
/// The child keeps its current separation from the parent and sweeps the
/// angle `ω·dt`, where `ω = sqrt(G·M/r³)`, in the rotation sense given by its
/// velocity relative to the parent (counter-clockwise if it has none yet).
///
/// Returns the new (position, velocity) pair.
pub fn scripted_orbit_step(
    child_pos: DVec2,
    child_vel: DVec2,
    parent_pos: DVec2,
    parent_vel: DVec2,
    parent_mass: f64,
    g: f64,
    dt: f64,
) -> (DVec2, DVec2) {
    let offset = child_pos - parent_pos;
    let r = offset.length();
    if r <= 0.0 || parent_mass <= 0.0 {
        return (child_pos, parent_vel);
    }

    let rel_vel = child_vel - parent_vel;
    let sense = if offset.perp_dot(rel_vel) < 0.0 { -1.0 } else { 1.0 };

    let omega = sense * (g * parent_mass / (r * r * r)).sqrt();
    let rotated = DVec2::from_angle(omega * dt).rotate(offset);

    let tangential = rotated.perp() * omega;
    (parent_pos + rotated, parent_vel + tangential)
}
