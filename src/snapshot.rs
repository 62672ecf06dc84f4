//! Save/restore boundary.
//!
//! A [`SimulationSnapshot`] is a flat, serde-friendly copy of a
//! [`GameSession`]. Vectors are stored as `[x, y]` arrays and handles as raw
//! integers so any serde format can carry it; choosing and writing that
//! format is the caller's job.
//!
//! Restoring rebuilds the arenas under the original handles, registers
//! every body with the gravity simulator, and resumes the clock, so the
//! next tick of the restored session matches the next tick of the original.

use bevy::color::Srgba;
use bevy::log::info;
use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

use crate::arena::{IdLike, PlanetId, SatelliteId, SatelliteManagerId, VehicleManagerId};
use crate::celestial::{CelestialBody, PlanetMotion};
use crate::fuel::{FuelTank, FuelTransfer, TransferDirection};
use crate::physics::RegistrationError;
use crate::satellite::{
    RelaySession, Satellite, SatelliteConfig, SatelliteError, SatelliteManager, StationKeepingTarget,
};
use crate::session::{GameSession, SimulationConfig};
use crate::types::{CameraState, SimulationTime};
use crate::vehicle::{SpawnPoint, Vehicle, VehicleKind, VehicleManager, VehicleSpec, VehicleState};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("planet {id}: mass must be positive, got {mass}")]
    InvalidPlanetMass { id: u32, mass: f64 },

    #[error("planet {planet} orbits unknown planet {parent}")]
    UnknownParent { planet: u32, parent: u32 },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    #[error("player {id}: fuel {fuel} outside [0, {capacity}]")]
    InvalidFuel { id: u32, fuel: f64, capacity: f64 },

    #[error("satellite {satellite} relays to unknown satellite {partner}")]
    UnknownRelayPartner { satellite: u32, partner: u32 },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Satellite(#[from] SatelliteError),
}

// =============================================================================
// Records
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanetMotionRecord {
    Fixed,
    Scripted { parent: u32 },
    Dynamic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetRecord {
    pub id: u32,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub mass: f64,
    pub radius: f64,
    /// sRGBA components
    pub color: [f32; 4],
    pub is_main_planet: bool,
    pub motion: PlanetMotionRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub kind: VehicleKind,
    pub spec: VehicleSpec,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub rotation: f64,
    pub fuel: f64,
    pub state: VehicleState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub spawn_position: [f64; 2],
    pub spawn_velocity: [f64; 2],
    pub spawn_rotation: f64,
    /// `None` while a fresh rocket is waiting to spawn
    pub vehicle: Option<VehicleRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationKeepingRecord {
    pub planet: u32,
    pub specific_energy: f64,
    pub angular_momentum: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayRecord {
    pub partner: u32,
    pub direction: TransferDirection,
    pub rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteRecord {
    pub id: u32,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub mass: f64,
    pub fuel: f64,
    pub fuel_capacity: f64,
    pub initial_reserve: f64,
    pub config: SatelliteConfig,
    pub target: Option<StationKeepingRecord>,
    pub relay: Option<RelayRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteNetworkRecord {
    pub id: u32,
    /// Next satellite id, so restored networks never reuse one
    pub next_id: u32,
    pub satellites: Vec<SatelliteRecord>,
}

/// Complete capture of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub planets: Vec<PlanetRecord>,
    pub players: Vec<PlayerRecord>,
    pub satellite_networks: Vec<SatelliteNetworkRecord>,
    pub camera: CameraState,
    pub elapsed_time: f64,
    /// Next handle of each session arena, so removed ids stay retired
    #[serde(default)]
    pub next_planet_id: u32,
    #[serde(default)]
    pub next_player_id: u32,
    #[serde(default)]
    pub next_network_id: u32,
}

fn arr(v: DVec2) -> [f64; 2] {
    [v.x, v.y]
}

fn vec2(a: [f64; 2]) -> DVec2 {
    DVec2::new(a[0], a[1])
}

fn finite(a: [f64; 2]) -> bool {
    a[0].is_finite() && a[1].is_finite()
}

// =============================================================================
// Capture
// =============================================================================

impl PlanetRecord {
    fn capture(id: PlanetId, body: &CelestialBody) -> Self {
        let c = body.color;
        Self {
            id: id.into_raw(),
            position: arr(body.position),
            velocity: arr(body.velocity),
            mass: body.mass(),
            radius: body.radius(),
            color: [c.red, c.green, c.blue, c.alpha],
            is_main_planet: body.is_main_planet,
            motion: match body.motion {
                PlanetMotion::Fixed => PlanetMotionRecord::Fixed,
                PlanetMotion::Scripted { parent } => PlanetMotionRecord::Scripted {
                    parent: parent.into_raw(),
                },
                PlanetMotion::Dynamic => PlanetMotionRecord::Dynamic,
            },
        }
    }

    fn to_body(&self) -> CelestialBody {
        let [r, g, b, a] = self.color;
        let mut body = CelestialBody::new(vec2(self.position), self.mass, self.radius, Srgba::new(r, g, b, a));
        body.velocity = vec2(self.velocity);
        body.is_main_planet = self.is_main_planet;
        body.motion = match self.motion {
            PlanetMotionRecord::Fixed => PlanetMotion::Fixed,
            PlanetMotionRecord::Scripted { parent } => PlanetMotion::Scripted {
                parent: PlanetId::from_raw(parent),
            },
            PlanetMotionRecord::Dynamic => PlanetMotion::Dynamic,
        };
        body
    }
}

impl VehicleRecord {
    fn capture(vehicle: &Vehicle) -> Self {
        Self {
            kind: vehicle.kind(),
            spec: *vehicle.spec(),
            position: arr(vehicle.position),
            velocity: arr(vehicle.velocity),
            rotation: vehicle.rotation(),
            fuel: vehicle.fuel(),
            state: vehicle.state(),
        }
    }

    fn to_vehicle(&self) -> Vehicle {
        let at = SpawnPoint {
            position: vec2(self.position),
            velocity: vec2(self.velocity),
            rotation: self.rotation,
        };
        Vehicle::new(self.kind, self.spec, at)
            .with_fuel(self.fuel)
            .with_state(self.state)
    }
}

impl PlayerRecord {
    fn capture(id: VehicleManagerId, manager: &VehicleManager) -> Self {
        let spawn = manager.spawn_point();
        Self {
            id: id.into_raw(),
            spawn_position: arr(spawn.position),
            spawn_velocity: arr(spawn.velocity),
            spawn_rotation: spawn.rotation,
            vehicle: manager.active().map(VehicleRecord::capture),
        }
    }
}

impl SatelliteRecord {
    fn capture(satellite: &Satellite) -> Self {
        Self {
            id: satellite.id.into_raw(),
            position: arr(satellite.position),
            velocity: arr(satellite.velocity),
            mass: satellite.mass,
            fuel: satellite.reserve.amount(),
            fuel_capacity: satellite.reserve.capacity(),
            initial_reserve: satellite.initial_reserve,
            config: satellite.config.clone(),
            target: satellite.target.map(|t| StationKeepingRecord {
                planet: t.planet.into_raw(),
                specific_energy: t.specific_energy,
                angular_momentum: t.angular_momentum,
            }),
            relay: satellite.relay.map(|r| RelayRecord {
                partner: r.partner.into_raw(),
                direction: r.transfer.direction,
                rate: r.transfer.rate,
            }),
        }
    }

    fn to_satellite(&self) -> Result<Satellite, SnapshotError> {
        let relay = match self.relay {
            Some(record) => {
                let transfer = FuelTransfer::new(record.direction, record.rate)
                    .ok_or(SatelliteError::InvalidTransferRate(record.rate))?;
                Some(RelaySession {
                    partner: SatelliteId::from_raw(record.partner),
                    transfer,
                })
            }
            None => None,
        };
        Ok(Satellite {
            id: SatelliteId::from_raw(self.id),
            position: vec2(self.position),
            velocity: vec2(self.velocity),
            mass: self.mass,
            reserve: FuelTank::with_amount(self.fuel, self.fuel_capacity),
            initial_reserve: self.initial_reserve,
            config: self.config.clone().validated()?,
            target: self.target.map(|t| StationKeepingTarget {
                planet: PlanetId::from_raw(t.planet),
                specific_energy: t.specific_energy,
                angular_momentum: t.angular_momentum,
            }),
            relay,
        })
    }
}

impl SimulationSnapshot {
    /// Copy the state of `session`.
    pub fn capture(session: &GameSession) -> Self {
        let bodies = &session.bodies;
        Self {
            planets: bodies
                .planets
                .iter()
                .map(|(id, body)| PlanetRecord::capture(id, body))
                .collect(),
            players: bodies
                .vehicle_managers
                .iter()
                .map(|(id, manager)| PlayerRecord::capture(id, manager))
                .collect(),
            satellite_networks: bodies
                .satellite_managers
                .iter()
                .map(|(id, network)| SatelliteNetworkRecord {
                    id: id.into_raw(),
                    next_id: network.next_id(),
                    satellites: network.iter().map(SatelliteRecord::capture).collect(),
                })
                .collect(),
            camera: session.camera,
            elapsed_time: session.time.elapsed,
            next_planet_id: bodies.planets.next_raw(),
            next_player_id: bodies.vehicle_managers.next_raw(),
            next_network_id: bodies.satellite_managers.next_raw(),
        }
    }

    /// Check internal consistency without building anything.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if !self.elapsed_time.is_finite() {
            return Err(SnapshotError::NonFinite("elapsed time"));
        }

        let mut planet_ids = Vec::with_capacity(self.planets.len());
        for planet in &self.planets {
            if planet_ids.contains(&planet.id) {
                return Err(SnapshotError::DuplicateId { kind: "planet", id: planet.id });
            }
            planet_ids.push(planet.id);
            if !finite(planet.position) || !finite(planet.velocity) || !planet.radius.is_finite() {
                return Err(SnapshotError::NonFinite("planet state"));
            }
            if !planet.mass.is_finite() || planet.mass <= 0.0 {
                return Err(SnapshotError::InvalidPlanetMass {
                    id: planet.id,
                    mass: planet.mass,
                });
            }
        }
        for planet in &self.planets {
            if let PlanetMotionRecord::Scripted { parent } = planet.motion
                && (parent == planet.id || !planet_ids.contains(&parent))
            {
                return Err(SnapshotError::UnknownParent {
                    planet: planet.id,
                    parent,
                });
            }
        }

        let mut player_ids = Vec::with_capacity(self.players.len());
        for player in &self.players {
            if player_ids.contains(&player.id) {
                return Err(SnapshotError::DuplicateId { kind: "player", id: player.id });
            }
            player_ids.push(player.id);
            let Some(vehicle) = &player.vehicle else {
                continue;
            };
            if !finite(vehicle.position) || !finite(vehicle.velocity) || !vehicle.rotation.is_finite() {
                return Err(SnapshotError::NonFinite("vehicle state"));
            }
            if !(0.0..=vehicle.spec.max_fuel).contains(&vehicle.fuel) {
                return Err(SnapshotError::InvalidFuel {
                    id: player.id,
                    fuel: vehicle.fuel,
                    capacity: vehicle.spec.max_fuel,
                });
            }
        }

        let mut network_ids = Vec::with_capacity(self.satellite_networks.len());
        for network in &self.satellite_networks {
            if network_ids.contains(&network.id) {
                return Err(SnapshotError::DuplicateId {
                    kind: "satellite network",
                    id: network.id,
                });
            }
            network_ids.push(network.id);

            let sat_ids: Vec<u32> = network.satellites.iter().map(|s| s.id).collect();
            for (i, satellite) in network.satellites.iter().enumerate() {
                if sat_ids[..i].contains(&satellite.id) {
                    return Err(SnapshotError::DuplicateId {
                        kind: "satellite",
                        id: satellite.id,
                    });
                }
                if !finite(satellite.position) || !finite(satellite.velocity) {
                    return Err(SnapshotError::NonFinite("satellite state"));
                }
                if !(0.0..=satellite.fuel_capacity).contains(&satellite.fuel) {
                    return Err(SnapshotError::InvalidFuel {
                        id: satellite.id,
                        fuel: satellite.fuel,
                        capacity: satellite.fuel_capacity,
                    });
                }
                if let Some(relay) = satellite.relay
                    && !sat_ids.contains(&relay.partner)
                {
                    return Err(SnapshotError::UnknownRelayPartner {
                        satellite: satellite.id,
                        partner: relay.partner,
                    });
                }
            }
        }

        Ok(())
    }

    /// Build a live session equivalent to the captured one.
    ///
    /// Every body is registered with the gravity simulator in its original
    /// order. Nothing is returned on error.
    pub fn restore(&self, config: SimulationConfig) -> Result<GameSession, SnapshotError> {
        self.validate()?;

        let mut session = GameSession::new(config);

        for record in &self.planets {
            session
                .bodies
                .planets
                .insert(PlanetId::from_raw(record.id), record.to_body());
        }
        for record in &self.planets {
            session
                .gravity
                .add_planet(PlanetId::from_raw(record.id), &session.bodies)?;
        }

        for record in &self.players {
            let spawn = SpawnPoint {
                position: vec2(record.spawn_position),
                velocity: vec2(record.spawn_velocity),
                rotation: record.spawn_rotation,
            };
            let vehicle = record.vehicle.as_ref().map(VehicleRecord::to_vehicle);
            let manager = VehicleManager::with_vehicle(vehicle, spawn, session.config.vehicles.clone());
            let id = VehicleManagerId::from_raw(record.id);
            session.bodies.vehicle_managers.insert(id, manager);
            session.gravity.add_vehicle_manager(id, &session.bodies)?;
        }

        for record in &self.satellite_networks {
            let mut network = SatelliteManager::new(session.config.satellites.clone());
            for satellite in &record.satellites {
                network.restore_satellite(satellite.to_satellite()?)?;
            }
            network.reserve_ids_through(record.next_id);

            let id = SatelliteManagerId::from_raw(record.id);
            session.bodies.satellite_managers.insert(id, network);
            session.gravity.add_satellite_manager(id, &session.bodies)?;
        }

        session.bodies.planets.reserve_through(self.next_planet_id);
        session.bodies.vehicle_managers.reserve_through(self.next_player_id);
        session.bodies.satellite_managers.reserve_through(self.next_network_id);

        session.time = SimulationTime::resumed_at(self.elapsed_time);
        session.camera = self.camera;

        info!(
            "Restored session: {} planets, {} players, {} satellite networks at t={:.2}s",
            self.planets.len(),
            self.players.len(),
            self.satellite_networks.len(),
            self.elapsed_time
        );
        Ok(session)
    }
}
