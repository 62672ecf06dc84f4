//! Gravity simulation for vehicles, satellites and moving planets.
//!
//! The [`GravitySimulator`] owns no bodies. It keeps registries of handles
//! into the arenas held by the game session ([`SessionBodies`]) and resolves
//! them every tick; a handle whose body is gone is skipped.

mod gravity;
mod integrator;

#[cfg(test)]
mod proptest_physics;

use bevy::log::{debug, warn};
use bevy::math::DVec2;

pub use gravity::{GravitySource, compute_acceleration_from_sources, sources_except};
pub use integrator::{
    GravityAffected, GravityConfig, Surface, integrate_body, resolve_surface_contact, symplectic_euler_step,
};

use crate::arena::{Arena, PlanetId, SatelliteManagerId, VehicleManagerId};
use crate::celestial::{CelestialBody, PlanetMotion, scripted_orbit_step};
use crate::satellite::SatelliteManager;
use crate::vehicle::VehicleManager;

/// Read-only view of a planet for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanetSample {
    pub id: PlanetId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub mass: f64,
    pub radius: f64,
}

impl PlanetSample {
    pub fn from_body(id: PlanetId, body: &CelestialBody) -> Self {
        Self {
            id,
            position: body.position,
            velocity: body.velocity,
            mass: body.mass(),
            radius: body.radius(),
        }
    }
}

/// Per-tick context handed to local updates that need the planets.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Registered planets, in registration order
    pub planets: &'a [PlanetSample],
    pub gravitational_constant: f64,
}

impl TickContext<'static> {
    /// Context with no planets.
    pub fn empty(gravitational_constant: f64) -> Self {
        Self {
            planets: &[],
            gravitational_constant,
        }
    }
}

/// Every simulated object of a session, addressed by handle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionBodies {
    pub planets: Arena<PlanetId, CelestialBody>,
    pub vehicle_managers: Arena<VehicleManagerId, VehicleManager>,
    pub satellite_managers: Arena<SatelliteManagerId, SatelliteManager>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("body mass must be positive, got {0}")]
    InvalidMass(f64),

    #[error("unknown planet {0}")]
    UnknownPlanet(PlanetId),

    #[error("unknown vehicle manager {0}")]
    UnknownVehicleManager(VehicleManagerId),

    #[error("unknown satellite manager {0}")]
    UnknownSatelliteManager(SatelliteManagerId),
}

fn check_mass(mass: f64) -> Result<(), RegistrationError> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(RegistrationError::InvalidMass(mass))
    }
}

/// Advances registered bodies by one timestep.
///
/// Registries are ordered by registration and deduplicated by handle.
/// Updates are deterministic: no randomness, no dependence on anything but
/// the bodies and `dt`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GravitySimulator {
    config: GravityConfig,
    planets: Vec<PlanetId>,
    vehicle_managers: Vec<VehicleManagerId>,
    satellite_managers: Vec<SatelliteManagerId>,
}

impl GravitySimulator {
    pub fn new(config: GravityConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &GravityConfig {
        &self.config
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.config.gravitational_constant
    }

    pub fn planets(&self) -> &[PlanetId] {
        &self.planets
    }

    pub fn vehicle_managers(&self) -> &[VehicleManagerId] {
        &self.vehicle_managers
    }

    pub fn satellite_managers(&self) -> &[SatelliteManagerId] {
        &self.satellite_managers
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a planet as a gravity source.
    ///
    /// Returns `Ok(false)` if it was already registered.
    pub fn add_planet(&mut self, id: PlanetId, bodies: &SessionBodies) -> Result<bool, RegistrationError> {
        let planet = bodies.planets.get(id).ok_or(RegistrationError::UnknownPlanet(id))?;
        if let Err(err) = check_mass(planet.mass()) {
            warn!("Rejected planet {id}: {err}");
            return Err(err);
        }
        Ok(push_unique(&mut self.planets, id))
    }

    /// Register a vehicle manager; its active vehicle will feel gravity.
    ///
    /// A manager between vehicles (awaiting respawn) registers fine.
    pub fn add_vehicle_manager(
        &mut self,
        id: VehicleManagerId,
        bodies: &SessionBodies,
    ) -> Result<bool, RegistrationError> {
        let manager = bodies
            .vehicle_managers
            .get(id)
            .ok_or(RegistrationError::UnknownVehicleManager(id))?;
        if let Some(vehicle) = manager.active()
            && let Err(err) = check_mass(vehicle.mass())
        {
            warn!("Rejected vehicle manager {id}: {err}");
            return Err(err);
        }
        Ok(push_unique(&mut self.vehicle_managers, id))
    }

    /// Register a satellite network; all of its satellites will feel gravity.
    pub fn add_satellite_manager(
        &mut self,
        id: SatelliteManagerId,
        bodies: &SessionBodies,
    ) -> Result<bool, RegistrationError> {
        let manager = bodies
            .satellite_managers
            .get(id)
            .ok_or(RegistrationError::UnknownSatelliteManager(id))?;
        for satellite in manager.iter() {
            if let Err(err) = check_mass(satellite.mass()) {
                warn!("Rejected satellite manager {id}: {err}");
                return Err(err);
            }
        }
        Ok(push_unique(&mut self.satellite_managers, id))
    }

    /// Returns `true` if the planet was registered.
    pub fn remove_planet(&mut self, id: PlanetId) -> bool {
        remove_from(&mut self.planets, id)
    }

    pub fn remove_vehicle_manager(&mut self, id: VehicleManagerId) -> bool {
        remove_from(&mut self.vehicle_managers, id)
    }

    pub fn remove_satellite_manager(&mut self, id: SatelliteManagerId) -> bool {
        remove_from(&mut self.satellite_managers, id)
    }

    pub fn is_planet_registered(&self, id: PlanetId) -> bool {
        self.planets.contains(&id)
    }

    pub fn is_vehicle_manager_registered(&self, id: VehicleManagerId) -> bool {
        self.vehicle_managers.contains(&id)
    }

    pub fn is_satellite_manager_registered(&self, id: SatelliteManagerId) -> bool {
        self.satellite_managers.contains(&id)
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Registered planets that still exist, in registration order.
    pub fn planet_samples(&self, bodies: &SessionBodies) -> Vec<PlanetSample> {
        self.planets
            .iter()
            .filter_map(|&id| bodies.planets.get(id).map(|body| PlanetSample::from_body(id, body)))
            .collect()
    }

    /// Move scripted and dynamic planets.
    ///
    /// Dynamic planets are integrated first, under every other registered
    /// planet. Scripted planets then rotate around their parent's current
    /// state, in registration order, so a moon registered after its planet
    /// follows it within the same tick. Fixed planets never move.
    pub fn advance_planets(&self, dt: f64, bodies: &mut SessionBodies) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let g = self.config.gravitational_constant;

        let samples = self.planet_samples(bodies);
        let sources: Vec<GravitySource> = samples.iter().map(|p| (p.position, p.mass)).collect();

        for (index, sample) in samples.iter().enumerate() {
            let Some(body) = bodies.planets.get_mut(sample.id) else {
                continue;
            };
            if body.motion != PlanetMotion::Dynamic {
                continue;
            }
            let others = sources_except(&sources, index);
            let acc = compute_acceleration_from_sources(body.position, &others, g, self.config.min_separation);
            let (pos, vel) = symplectic_euler_step(body.position, body.velocity, acc, dt);
            body.position = pos;
            body.velocity = vel;
        }

        for &id in &self.planets {
            let Some(PlanetMotion::Scripted { parent }) = bodies.planets.get(id).map(|b| b.motion) else {
                continue;
            };
            let Some(parent_sample) = bodies.planets.get(parent).map(|b| PlanetSample::from_body(parent, b)) else {
                debug!("Planet {id} orbits missing parent {parent}; holding position");
                continue;
            };
            let Some(body) = bodies.planets.get_mut(id) else {
                continue;
            };
            let (pos, vel) = scripted_orbit_step(
                body.position,
                body.velocity,
                parent_sample.position,
                parent_sample.velocity,
                parent_sample.mass,
                g,
                dt,
            );
            body.position = pos;
            body.velocity = vel;
        }
    }

    /// Integrate every registered vehicle and satellite by `dt`.
    ///
    /// Each body accumulates `G·M/r²` toward every registered planet, pairs
    /// closer than the minimum separation contributing nothing, then takes
    /// one semi-implicit Euler step. Stale handles are skipped.
    pub fn update(&self, dt: f64, bodies: &mut SessionBodies) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }

        let samples = self.planet_samples(bodies);
        let sources: Vec<GravitySource> = samples.iter().map(|p| (p.position, p.mass)).collect();
        let surfaces: Vec<Surface> = samples.iter().map(|p| (p.position, p.velocity, p.radius)).collect();

        for &id in &self.vehicle_managers {
            let Some(manager) = bodies.vehicle_managers.get_mut(id) else {
                debug!("Skipping stale vehicle manager {id}");
                continue;
            };
            if let Some(vehicle) = manager.active_mut() {
                self.step_body(vehicle, &sources, &surfaces, dt);
            }
        }

        for &id in &self.satellite_managers {
            let Some(manager) = bodies.satellite_managers.get_mut(id) else {
                debug!("Skipping stale satellite manager {id}");
                continue;
            };
            for satellite in manager.satellites_mut() {
                self.step_body(satellite, &sources, &surfaces, dt);
            }
        }
    }

    fn step_body<B: GravityAffected + ?Sized>(
        &self,
        body: &mut B,
        sources: &[GravitySource],
        surfaces: &[Surface],
        dt: f64,
    ) {
        let acc = compute_acceleration_from_sources(
            body.position(),
            sources,
            self.config.gravitational_constant,
            self.config.min_separation,
        );
        integrate_body(body, acc, dt);
        if self.config.resolve_surface_contact {
            resolve_surface_contact(body, surfaces);
        }
    }
}

fn push_unique<T: PartialEq>(registry: &mut Vec<T>, id: T) -> bool {
    if registry.contains(&id) {
        return false;
    }
    registry.push(id);
    true
}

fn remove_from<T: PartialEq>(registry: &mut Vec<T>, id: T) -> bool {
    let before = registry.len();
    registry.retain(|entry| *entry != id);
    registry.len() != before
}
