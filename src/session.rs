//! The game session: owner of every simulated object.
//!
//! [`GameSession`] holds the body arenas, the gravity simulator's
//! registries, the simulation clock and the camera placement. One call to
//! [`GameSession::tick`] advances everything in a fixed order:
//!
//! 1. planets (scripted and dynamic motion)
//! 2. vehicle managers (respawn, engine burn)
//! 3. satellite managers (links, relays, station keeping)
//! 4. gravity integration of vehicles and satellites

use std::collections::BTreeMap;

use bevy::log::{debug, warn};
use bevy::math::DVec2;
use bevy::prelude::Resource;

use crate::arena::{PlanetId, SatelliteId, SatelliteManagerId, VehicleManagerId};
use crate::celestial::CelestialBody;
use crate::orbit::{self, ClosestPlanet};
use crate::physics::{GravityConfig, GravitySimulator, RegistrationError, SessionBodies, TickContext};
use crate::satellite::{RocketProbe, SatelliteConversionConfig, SatelliteManager, SatelliteNetworkConfig};
use crate::snapshot::{SimulationSnapshot, SnapshotError};
use crate::types::{CameraState, SimulationTime};
use crate::vehicle::{ConversionError, Telemetry, VehicleConfig, VehicleKind, VehicleManager};

/// Everything needed to build a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationConfig {
    pub gravity: GravityConfig,
    pub vehicles: VehicleConfig,
    pub satellites: SatelliteNetworkConfig,
}

#[derive(Resource, Clone, Debug)]
pub struct GameSession {
    pub(crate) config: SimulationConfig,
    pub(crate) bodies: SessionBodies,
    pub(crate) gravity: GravitySimulator,
    pub time: SimulationTime,
    pub camera: CameraState,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl GameSession {
    pub fn new(config: SimulationConfig) -> Self {
        let gravity = GravitySimulator::new(config.gravity.clone());
        Self {
            config,
            bodies: SessionBodies::default(),
            gravity,
            time: SimulationTime::default(),
            camera: CameraState::default(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn bodies(&self) -> &SessionBodies {
        &self.bodies
    }

    pub fn gravity(&self) -> &GravitySimulator {
        &self.gravity
    }

    pub fn planet(&self, id: PlanetId) -> Option<&CelestialBody> {
        self.bodies.planets.get(id)
    }

    pub fn vehicle_manager(&self, id: VehicleManagerId) -> Option<&VehicleManager> {
        self.bodies.vehicle_managers.get(id)
    }

    pub fn vehicle_manager_mut(&mut self, id: VehicleManagerId) -> Option<&mut VehicleManager> {
        self.bodies.vehicle_managers.get_mut(id)
    }

    pub fn satellite_manager(&self, id: SatelliteManagerId) -> Option<&SatelliteManager> {
        self.bodies.satellite_managers.get(id)
    }

    pub fn satellite_manager_mut(&mut self, id: SatelliteManagerId) -> Option<&mut SatelliteManager> {
        self.bodies.satellite_managers.get_mut(id)
    }

    /// The planet flagged as home, if any.
    pub fn main_planet(&self) -> Option<PlanetId> {
        self.bodies
            .planets
            .iter()
            .find(|(_, body)| body.is_main_planet)
            .map(|(id, _)| id)
    }

    // =========================================================================
    // Population
    // =========================================================================

    /// Add and register a planet. Nothing is kept if registration fails.
    pub fn add_planet(&mut self, body: CelestialBody) -> Result<PlanetId, RegistrationError> {
        let id = self.bodies.planets.push(body);
        if let Err(err) = self.gravity.add_planet(id, &self.bodies) {
            self.bodies.planets.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Add and register a vehicle manager.
    pub fn add_vehicle_manager(&mut self, manager: VehicleManager) -> Result<VehicleManagerId, RegistrationError> {
        let id = self.bodies.vehicle_managers.push(manager);
        if let Err(err) = self.gravity.add_vehicle_manager(id, &self.bodies) {
            self.bodies.vehicle_managers.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Add and register a satellite network.
    pub fn add_satellite_manager(
        &mut self,
        manager: SatelliteManager,
    ) -> Result<SatelliteManagerId, RegistrationError> {
        let id = self.bodies.satellite_managers.push(manager);
        if let Err(err) = self.gravity.add_satellite_manager(id, &self.bodies) {
            self.bodies.satellite_managers.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Deregister, then drop, a planet.
    pub fn remove_planet(&mut self, id: PlanetId) -> Option<CelestialBody> {
        self.gravity.remove_planet(id);
        self.bodies.planets.remove(id)
    }

    pub fn remove_vehicle_manager(&mut self, id: VehicleManagerId) -> Option<VehicleManager> {
        self.gravity.remove_vehicle_manager(id);
        self.bodies.vehicle_managers.remove(id)
    }

    pub fn remove_satellite_manager(&mut self, id: SatelliteManagerId) -> Option<SatelliteManager> {
        self.gravity.remove_satellite_manager(id);
        self.bodies.satellite_managers.remove(id)
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance by a real-time frame delta, honouring pause and time scale.
    ///
    /// Returns the simulated step actually taken.
    pub fn step(&mut self, real_dt: f64) -> f64 {
        let dt = self.time.scaled_step(real_dt);
        if dt > 0.0 {
            self.tick(dt);
        }
        dt
    }

    /// Advance the whole simulation by `dt` simulated seconds.
    pub fn tick(&mut self, dt: f64) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }

        self.gravity.advance_planets(dt, &mut self.bodies);

        for manager in self.bodies.vehicle_managers.values_mut() {
            manager.update(dt);
        }

        self.update_satellite_networks(dt);

        self.gravity.update(dt, &mut self.bodies);
        self.time.elapsed += dt;
    }

    /// Run every satellite network and hand relayed fuel to the rockets.
    ///
    /// Rocket probes are rebuilt before each network so a rocket never
    /// trades more than its tank allows across several networks.
    fn update_satellite_networks(&mut self, dt: f64) {
        let samples = self.gravity.planet_samples(&self.bodies);
        let ctx = TickContext {
            planets: &samples,
            gravitational_constant: self.gravity.gravitational_constant(),
        };

        // A rocket relays with one network per tick: the one owning its closest satellite.
        let owners = relay_owners(&self.bodies, &rocket_probes(&self.bodies));

        let network_ids: Vec<SatelliteManagerId> = self.bodies.satellite_managers.ids().collect();
        for network_id in network_ids {
            let probes = rocket_probes(&self.bodies)
                .into_iter()
                .map(|probe| match owners.get(&probe.manager) {
                    Some(owner) if *owner == network_id => probe,
                    _ => RocketProbe { transfer: None, ..probe },
                })
                .collect();
            let Some(network) = self.bodies.satellite_managers.get_mut(network_id) else {
                continue;
            };
            network.set_nearby_rockets(probes);
            let report = network.update(dt, &ctx);

            for exchange in report.rocket_exchanges {
                let Some(manager) = self.bodies.vehicle_managers.get_mut(exchange.manager) else {
                    continue;
                };
                let applied = manager.receive_fuel(exchange.delta);
                if (applied - exchange.delta).abs() > 1e-9 {
                    warn!(
                        "Rocket {} could only take {applied:.4} of {:.4} relayed fuel",
                        exchange.manager, exchange.delta
                    );
                }
                if exchange.session_ended {
                    manager.stop_fuel_transfer();
                }
            }
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Convert the active rocket of `vehicles` into a satellite of `network`.
    ///
    /// On success both managers are registered again with the gravity
    /// simulator. On failure nothing changes.
    pub fn request_satellite_conversion(
        &mut self,
        vehicles: VehicleManagerId,
        network: SatelliteManagerId,
        config: SatelliteConversionConfig,
    ) -> Result<SatelliteId, ConversionError> {
        let satellites = self
            .bodies
            .satellite_managers
            .get_mut(network)
            .ok_or(ConversionError::UnknownSatelliteManager)?;
        let manager = self
            .bodies
            .vehicle_managers
            .get_mut(vehicles)
            .ok_or(ConversionError::UnknownVehicleManager)?;

        let id = manager.convert_to_satellite(satellites, config)?;

        if let Err(err) = self.gravity.add_vehicle_manager(vehicles, &self.bodies) {
            warn!("Re-registering vehicle manager {vehicles} after conversion failed: {err}");
        }
        if let Err(err) = self.gravity.add_satellite_manager(network, &self.bodies) {
            warn!("Re-registering satellite manager {network} after conversion failed: {err}");
        }
        debug!("Conversion into {id} complete, registries refreshed");
        Ok(id)
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// Flight readout for a vehicle manager's active vehicle.
    pub fn telemetry(&self, id: VehicleManagerId) -> Option<Telemetry> {
        let manager = self.bodies.vehicle_managers.get(id)?;
        let samples = self.gravity.planet_samples(&self.bodies);
        manager.telemetry(&samples, self.gravity.gravitational_constant())
    }

    /// Closest registered planet to `position`.
    pub fn closest_planet(&self, position: DVec2) -> Option<ClosestPlanet<PlanetId>> {
        let samples = self.gravity.planet_samples(&self.bodies);
        orbit::find_closest_planet(position, samples.iter().map(|p| (p.id, p.position)))
    }

    /// Capture the session for saving.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot::capture(self)
    }

    /// Rebuild a session from a saved snapshot.
    pub fn restore(snapshot: &SimulationSnapshot, config: SimulationConfig) -> Result<Self, SnapshotError> {
        snapshot.restore(config)
    }
}

fn rocket_probes(bodies: &SessionBodies) -> Vec<RocketProbe> {
    bodies
        .vehicle_managers
        .iter()
        .filter_map(|(id, manager)| {
            let vehicle = manager.active()?;
            (vehicle.kind() == VehicleKind::Rocket).then(|| RocketProbe {
                manager: id,
                position: vehicle.position,
                fuel: vehicle.fuel(),
                max_fuel: vehicle.max_fuel(),
                transfer: vehicle.active_fuel_transfer(),
            })
        })
        .collect()
}

/// Network holding the closest in-range satellite of each rocket.
///
/// Ties go to the lower network id.
fn relay_owners(bodies: &SessionBodies, probes: &[RocketProbe]) -> BTreeMap<VehicleManagerId, SatelliteManagerId> {
    let mut owners = BTreeMap::new();
    for probe in probes {
        let mut best: Option<(SatelliteManagerId, f64)> = None;
        for (network_id, network) in bodies.satellite_managers.iter() {
            let Some(sat) = network.closest_in_range(probe.position) else {
                continue;
            };
            let d2 = sat.position.distance_squared(probe.position);
            if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
                best = Some((network_id, d2));
            }
        }
        if let Some((network_id, _)) = best {
            owners.insert(probe.manager, network_id);
        }
    }
    owners
}
