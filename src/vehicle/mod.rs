//! Player vehicles and the manager that owns the active one.
//!
//! A [`VehicleManager`] holds at most one [`Vehicle`] at a time. Control
//! intents (thrust, rotate, fuel transfer, satellite conversion) go through
//! the manager; the gravity simulator moves the vehicle afterwards.
//!
//! # Engine state machine
//!
//! ```text
//!            apply_thrust(l≠0)                 start_fuel_transfer_*
//!   Idle ──────────────────────▶ Thrusting(l) ─────────────────────▶ TransferringFuel
//!    ▲  ◀── apply_thrust(0) ───       │  ▲                                │
//!    │  ◀── tank empty ──────────────┘  └──────── apply_thrust(l≠0) ─────┤
//!    └──────────────── stop_fuel_transfer / source or destination exhausted ┘
//! ```

pub mod spec;
pub mod thrust;

use bevy::log::{debug, info, warn};
use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

pub use spec::{SpawnPoint, VehicleConfig, VehicleKind, VehicleSpec};

use crate::arena::PlanetId;
use crate::fuel::{FuelTank, FuelTransfer, TransferDirection};
use crate::orbit::{self, Apsis};
use crate::physics::{GravityAffected, PlanetSample};
use crate::satellite::{SatelliteConfig, SatelliteError, SatelliteId, SatelliteManager};
use crate::types::normalize_degrees;

use self::thrust::compute_burn;

/// Engine/transfer state of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum VehicleState {
    #[default]
    Idle,
    /// Commanded signed thrust level in [-1, 1].
    Thrusting(f64),
    /// A fuel transfer session is open.
    TransferringFuel(FuelTransfer),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VehicleError {
    #[error("no active vehicle")]
    NoActiveVehicle,

    #[error("invalid thrust level {0}")]
    InvalidThrustLevel(f64),

    #[error("invalid rotation {0}")]
    InvalidRotation(f64),

    #[error("invalid transfer rate {0} (must be positive)")]
    InvalidTransferRate(f64),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("no active vehicle to convert")]
    NoActiveVehicle,

    #[error("only rockets can become satellites (active vehicle is a {})", .0.name())]
    NotARocket(VehicleKind),

    #[error("unknown vehicle manager")]
    UnknownVehicleManager,

    #[error("unknown satellite manager")]
    UnknownSatelliteManager,

    #[error("satellite network refused the conversion: {0}")]
    Satellite(#[from] SatelliteError),
}

/// What a renderer needs to draw the active vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawHint {
    pub kind: VehicleKind,
    pub position: DVec2,
    pub rotation: f64,
    /// Engine plume visible this frame
    pub thrusting: bool,
    pub transferring: bool,
}

/// On-demand flight readout for the active vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    /// Planet the readout is relative to
    pub reference_planet: PlanetId,
    /// Height above that planet's surface
    pub altitude: f64,
    /// Speed relative to that planet
    pub speed: f64,
    pub apoapsis: Apsis,
    pub periapsis: Apsis,
    pub fuel: f64,
    pub fuel_fraction: f64,
    pub rotation: f64,
}

/// A rocket or car.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    kind: VehicleKind,
    spec: VehicleSpec,
    pub position: DVec2,
    pub velocity: DVec2,
    rotation: f64,
    tank: FuelTank,
    state: VehicleState,
}

impl Vehicle {
    /// Fresh vehicle with a full tank.
    pub fn new(kind: VehicleKind, spec: VehicleSpec, spawn: SpawnPoint) -> Self {
        Self {
            kind,
            spec,
            position: spawn.position,
            velocity: spawn.velocity,
            rotation: normalize_degrees(spawn.rotation),
            tank: FuelTank::full(spec.max_fuel),
            state: VehicleState::Idle,
        }
    }

    /// Builder: start with `fuel` units (clamped to the tank).
    pub fn with_fuel(mut self, fuel: f64) -> Self {
        self.tank = FuelTank::with_amount(fuel, self.spec.max_fuel);
        self
    }

    /// Builder: restore an engine state.
    pub fn with_state(mut self, state: VehicleState) -> Self {
        self.state = state;
        self
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    pub fn spec(&self) -> &VehicleSpec {
        &self.spec
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn fuel(&self) -> f64 {
        self.tank.amount()
    }

    pub fn max_fuel(&self) -> f64 {
        self.tank.capacity()
    }

    pub fn tank(&self) -> &FuelTank {
        &self.tank
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Current commanded thrust level (0 unless thrusting).
    pub fn thrust_level(&self) -> f64 {
        match self.state {
            VehicleState::Thrusting(level) => level,
            _ => 0.0,
        }
    }

    /// The open transfer session, if any.
    pub fn active_fuel_transfer(&self) -> Option<FuelTransfer> {
        match self.state {
            VehicleState::TransferringFuel(transfer) => Some(transfer),
            _ => None,
        }
    }

    /// Mass including fuel.
    pub fn mass(&self) -> f64 {
        self.spec.mass_with_fuel(self.tank.amount())
    }

    pub fn draw_hint(&self) -> DrawHint {
        DrawHint {
            kind: self.kind,
            position: self.position,
            rotation: self.rotation,
            thrusting: matches!(self.state, VehicleState::Thrusting(_)) && !self.tank.is_empty(),
            transferring: matches!(self.state, VehicleState::TransferringFuel(_)),
        }
    }

    fn set_thrust(&mut self, level: f64) {
        if level == 0.0 {
            if matches!(self.state, VehicleState::Thrusting(_)) {
                self.state = VehicleState::Idle;
            }
        } else {
            self.state = VehicleState::Thrusting(level);
        }
    }

    fn start_transfer(&mut self, transfer: FuelTransfer) {
        self.state = VehicleState::TransferringFuel(transfer);
        debug!(
            "{} opened fuel transfer {:?} at {:.2}/s",
            self.kind.name(),
            transfer.direction,
            transfer.rate
        );
    }

    fn stop_transfer(&mut self) {
        if let VehicleState::TransferringFuel(_) = self.state {
            self.state = VehicleState::Idle;
            debug!("{} closed fuel transfer", self.kind.name());
        }
    }

    /// Burn fuel for one tick and apply the resulting velocity change.
    ///
    /// An empty tank clamps thrust to zero and drops back to `Idle`. A
    /// transfer session whose local side is exhausted closes as well.
    fn update(&mut self, dt: f64) {
        let level = match self.state {
            VehicleState::Thrusting(level) => level,
            VehicleState::TransferringFuel(transfer) => {
                let exhausted = match transfer.direction {
                    TransferDirection::Out => self.tank.is_empty(),
                    TransferDirection::In => self.tank.is_full(),
                };
                if exhausted {
                    self.stop_transfer();
                }
                return;
            }
            VehicleState::Idle => return,
        };

        let burn = compute_burn(
            level,
            self.rotation,
            self.tank.amount(),
            self.spec.burn_rate,
            self.spec.max_thrust,
            self.mass(),
            dt,
        );
        self.tank.draw(burn.fuel_used);
        self.velocity += burn.delta_v;

        if self.tank.is_empty() {
            self.state = VehicleState::Idle;
            debug!("{} out of fuel, engine off", self.kind.name());
        }
    }
}

impl GravityAffected for Vehicle {
    fn position(&self) -> DVec2 {
        self.position
    }

    fn velocity(&self) -> DVec2 {
        self.velocity
    }

    fn mass(&self) -> f64 {
        Vehicle::mass(self)
    }

    fn set_kinematics(&mut self, position: DVec2, velocity: DVec2) {
        self.position = position;
        self.velocity = velocity;
    }
}

/// Owns the player's active vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleManager {
    active: Option<Vehicle>,
    spawn: SpawnPoint,
    config: VehicleConfig,
    respawn_pending: bool,
}

impl VehicleManager {
    /// Manager with a fresh default rocket at the spawn point.
    pub fn new(spawn: SpawnPoint, config: VehicleConfig) -> Self {
        let rocket = Vehicle::new(VehicleKind::Rocket, config.rocket, spawn);
        Self {
            active: Some(rocket),
            spawn,
            config,
            respawn_pending: false,
        }
    }

    /// Manager driving an existing vehicle (or none, awaiting respawn).
    pub fn with_vehicle(vehicle: Option<Vehicle>, spawn: SpawnPoint, config: VehicleConfig) -> Self {
        let respawn_pending = vehicle.is_none();
        Self {
            active: vehicle,
            spawn,
            config,
            respawn_pending,
        }
    }

    pub fn active(&self) -> Option<&Vehicle> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Vehicle> {
        self.active.as_mut()
    }

    pub fn spawn_point(&self) -> SpawnPoint {
        self.spawn
    }

    pub fn set_spawn_point(&mut self, spawn: SpawnPoint) {
        self.spawn = spawn;
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// A fresh rocket will appear on the next update.
    pub fn is_respawn_pending(&self) -> bool {
        self.respawn_pending
    }

    pub fn position(&self) -> Option<DVec2> {
        self.active.as_ref().map(|v| v.position)
    }

    pub fn velocity(&self) -> Option<DVec2> {
        self.active.as_ref().map(|v| v.velocity)
    }

    pub fn draw_hint(&self) -> Option<DrawHint> {
        self.active.as_ref().map(Vehicle::draw_hint)
    }

    fn vehicle_mut(&mut self) -> Result<&mut Vehicle, VehicleError> {
        self.active.as_mut().ok_or(VehicleError::NoActiveVehicle)
    }

    /// Command a signed thrust level. Values are clamped to [-1, 1]; zero
    /// cuts the engine. Thrusting closes any open transfer session.
    pub fn apply_thrust(&mut self, level: f64) -> Result<(), VehicleError> {
        if !level.is_finite() {
            return Err(VehicleError::InvalidThrustLevel(level));
        }
        let vehicle = self.vehicle_mut()?;
        vehicle.set_thrust(level.clamp(-1.0, 1.0));
        Ok(())
    }

    /// Turn by `delta_deg`. Instantaneous and free.
    pub fn rotate(&mut self, delta_deg: f64) -> Result<(), VehicleError> {
        if !delta_deg.is_finite() {
            return Err(VehicleError::InvalidRotation(delta_deg));
        }
        let vehicle = self.vehicle_mut()?;
        vehicle.rotation = normalize_degrees(vehicle.rotation + delta_deg);
        Ok(())
    }

    /// Open a session pulling fuel into the vehicle, replacing any open one.
    pub fn start_fuel_transfer_in(&mut self, rate: f64) -> Result<(), VehicleError> {
        self.start_fuel_transfer(TransferDirection::In, rate)
    }

    /// Open a session pushing fuel out of the vehicle, replacing any open one.
    pub fn start_fuel_transfer_out(&mut self, rate: f64) -> Result<(), VehicleError> {
        self.start_fuel_transfer(TransferDirection::Out, rate)
    }

    fn start_fuel_transfer(&mut self, direction: TransferDirection, rate: f64) -> Result<(), VehicleError> {
        let transfer = FuelTransfer::new(direction, rate).ok_or(VehicleError::InvalidTransferRate(rate))?;
        self.vehicle_mut()?.start_transfer(transfer);
        Ok(())
    }

    /// Close the open session. A no-op when none is open.
    pub fn stop_fuel_transfer(&mut self) {
        if let Some(vehicle) = self.active.as_mut() {
            vehicle.stop_transfer();
        }
    }

    /// Apply a relayed fuel change to the active vehicle, clamped to its tank.
    ///
    /// Positive `delta` adds fuel. Returns the change actually applied.
    pub fn receive_fuel(&mut self, delta: f64) -> f64 {
        match self.active.as_mut() {
            Some(vehicle) => vehicle.tank.apply(delta),
            None => 0.0,
        }
    }

    /// Per-tick local update: respawn if pending, then engine burn.
    pub fn update(&mut self, dt: f64) {
        if self.respawn_pending {
            self.respawn();
        }
        if let Some(vehicle) = self.active.as_mut() {
            vehicle.update(dt);
        }
    }

    /// Replace the active vehicle with a fresh default rocket at the spawn point.
    pub fn respawn(&mut self) {
        self.active = Some(Vehicle::new(VehicleKind::Rocket, self.config.rocket, self.spawn));
        self.respawn_pending = false;
        info!("Spawned fresh rocket at ({:.1}, {:.1})", self.spawn.position.x, self.spawn.position.y);
    }

    /// Swap the active vehicle for a fresh one of `kind` at the same place.
    ///
    /// Fuel carries over, clamped to the new tank. Any open session or burn
    /// ends with the old vehicle.
    pub fn switch_vehicle(&mut self, kind: VehicleKind) -> Result<(), VehicleError> {
        let old = self.active.take().ok_or(VehicleError::NoActiveVehicle)?;
        let spawn = SpawnPoint {
            position: old.position,
            velocity: old.velocity,
            rotation: old.rotation,
        };
        let replacement = Vehicle::new(kind, self.config.spec_for(kind), spawn).with_fuel(old.fuel());
        debug!("Switched {} -> {}", old.kind.name(), kind.name());
        self.active = Some(replacement);
        Ok(())
    }

    /// Turn the active rocket into a satellite.
    ///
    /// The satellite inherits the rocket's position, velocity, mass and fuel.
    /// On success the rocket is gone and a fresh default rocket appears at
    /// the spawn point on the next update. On failure nothing changes.
    ///
    /// The caller must re-register this manager and `satellites` with the
    /// gravity simulator afterwards.
    pub fn convert_to_satellite(
        &mut self,
        satellites: &mut SatelliteManager,
        config: SatelliteConfig,
    ) -> Result<SatelliteId, ConversionError> {
        let vehicle = self.active.as_ref().ok_or(ConversionError::NoActiveVehicle)?;
        if vehicle.kind != VehicleKind::Rocket {
            return Err(ConversionError::NotARocket(vehicle.kind));
        }

        let reserve = FuelTank::with_amount(vehicle.fuel(), vehicle.max_fuel());
        let id = match satellites.create_satellite_with_reserve(
            vehicle.position,
            vehicle.velocity,
            vehicle.mass(),
            reserve,
            config,
        ) {
            Ok(id) => id,
            Err(err) => {
                warn!("Satellite conversion failed: {err}");
                return Err(err.into());
            }
        };

        self.active = None;
        self.respawn_pending = true;
        info!("Rocket converted into satellite {id}");
        Ok(id)
    }

    /// Flight readout relative to the closest planet.
    ///
    /// `None` without an active vehicle or without planets.
    pub fn telemetry(&self, planets: &[PlanetSample], g: f64) -> Option<Telemetry> {
        let vehicle = self.active.as_ref()?;
        let closest = orbit::find_closest_planet(
            vehicle.position,
            planets.iter().map(|p| (p, p.position)),
        )?;
        let planet = closest.key;

        let rel_pos = vehicle.position - planet.position;
        let rel_vel = vehicle.velocity - planet.velocity;

        Some(Telemetry {
            reference_planet: planet.id,
            altitude: closest.distance - planet.radius,
            speed: rel_vel.length(),
            apoapsis: orbit::apoapsis(rel_pos, rel_vel, planet.mass, g),
            periapsis: orbit::periapsis(rel_pos, rel_vel, planet.mass, g),
            fuel: vehicle.fuel(),
            fuel_fraction: vehicle.tank.fraction(),
            rotation: vehicle.rotation,
        })
    }
}
