//! Satellite networks.
//!
//! A [`SatelliteManager`] owns every satellite of one network. Each tick it
//! refreshes which satellites and rockets are within transfer range, moves
//! fuel for open relay sessions, and runs station keeping. The gravity
//! simulator moves the satellites afterwards.

pub mod relay;
pub mod station_keeping;

use bevy::log::{debug, info};
use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

pub use crate::arena::SatelliteId;
pub use relay::{RocketFuelExchange, RocketProbe, SatelliteTickReport};
pub use station_keeping::StationKeepingTarget;

use crate::arena::{Arena, IdLike, VehicleManagerId};
use crate::fuel::{FuelTank, FuelTransfer, TransferDirection};
use crate::orbit;
use crate::physics::{GravityAffected, TickContext};

use self::station_keeping::{StationKeepingParams, compute_correction};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SatelliteError {
    #[error("satellite network is full ({0} satellites)")]
    CapacityReached(usize),

    #[error("invalid satellite mass {0}")]
    InvalidMass(f64),

    #[error("invalid satellite configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("unknown satellite {0}")]
    UnknownSatellite(SatelliteId),

    #[error("invalid relay rate {0} (must be positive)")]
    InvalidTransferRate(f64),

    #[error("satellite {0} cannot relay to itself")]
    SelfRelay(SatelliteId),

    #[error("satellite {0} already exists")]
    DuplicateSatellite(SatelliteId),
}

/// Per-satellite settings chosen at conversion time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteConfig {
    /// Hold the orbit flown when station keeping first engages
    pub maintain_current_orbit: bool,
    /// Station keeping stops once the reserve falls below this fraction of
    /// the reserve the satellite started with. In [0, 1].
    pub maintenance_fuel_percent: f64,
    /// Scales thruster authority for station keeping. Non-negative.
    pub station_keeping_efficiency: f64,
    /// Maximum distance for links and relays
    pub transfer_range: f64,
    pub custom_name: Option<String>,
}

/// Name used by control surfaces when requesting a conversion.
pub type SatelliteConversionConfig = SatelliteConfig;

impl Default for SatelliteConfig {
    fn default() -> Self {
        Self {
            maintain_current_orbit: true,
            maintenance_fuel_percent: 0.2,
            station_keeping_efficiency: 1.0,
            transfer_range: 150.0,
            custom_name: None,
        }
    }
}

impl SatelliteConfig {
    /// Reject unusable values; clamp the maintenance fraction into [0, 1].
    pub fn validated(mut self) -> Result<Self, SatelliteError> {
        if !self.maintenance_fuel_percent.is_finite() {
            return Err(SatelliteError::InvalidConfig("maintenance fuel percent must be finite"));
        }
        if !self.station_keeping_efficiency.is_finite() || self.station_keeping_efficiency < 0.0 {
            return Err(SatelliteError::InvalidConfig("station keeping efficiency must be non-negative"));
        }
        if self.transfer_range.is_nan() || self.transfer_range < 0.0 {
            return Err(SatelliteError::InvalidConfig("transfer range must be non-negative"));
        }
        self.maintenance_fuel_percent = self.maintenance_fuel_percent.clamp(0.0, 1.0);
        Ok(self)
    }
}

/// Network-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteNetworkConfig {
    pub max_satellites: usize,
    /// Reserve given to satellites created without one
    pub default_fuel_reserve: f64,
    /// Mass given to satellites created without one
    pub default_mass: f64,
    /// Correction acceleration at efficiency 1.0
    pub station_keeping_acceleration: f64,
    pub fuel_per_delta_v: f64,
    /// Velocity errors below this are left alone
    pub station_keeping_deadband: f64,
}

impl Default for SatelliteNetworkConfig {
    fn default() -> Self {
        Self {
            max_satellites: 32,
            default_fuel_reserve: 50.0,
            default_mass: 50.0,
            station_keeping_acceleration: 2.0,
            fuel_per_delta_v: 0.05,
            station_keeping_deadband: 0.05,
        }
    }
}

impl SatelliteNetworkConfig {
    fn station_keeping_params(&self) -> StationKeepingParams {
        StationKeepingParams {
            max_acceleration: self.station_keeping_acceleration,
            fuel_per_delta_v: self.fuel_per_delta_v,
            deadband: self.station_keeping_deadband,
        }
    }
}

/// Satellite-to-satellite relay owned by one end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelaySession {
    pub partner: SatelliteId,
    /// Direction seen from the owner
    pub transfer: FuelTransfer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Satellite {
    pub(crate) id: SatelliteId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub(crate) mass: f64,
    pub(crate) reserve: FuelTank,
    /// Reserve at creation; the maintenance threshold is relative to it
    pub(crate) initial_reserve: f64,
    pub(crate) config: SatelliteConfig,
    pub(crate) target: Option<StationKeepingTarget>,
    pub(crate) relay: Option<RelaySession>,
}

impl Satellite {
    pub fn id(&self) -> SatelliteId {
        self.id
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn fuel(&self) -> f64 {
        self.reserve.amount()
    }

    pub fn reserve(&self) -> &FuelTank {
        &self.reserve
    }

    pub fn initial_reserve(&self) -> f64 {
        self.initial_reserve
    }

    pub fn config(&self) -> &SatelliteConfig {
        &self.config
    }

    /// Display name: the custom one or `SAT-<id>`.
    pub fn name(&self) -> String {
        match &self.config.custom_name {
            Some(name) => name.clone(),
            None => format!("SAT-{}", self.id.into_raw()),
        }
    }

    pub fn station_keeping_target(&self) -> Option<&StationKeepingTarget> {
        self.target.as_ref()
    }

    pub fn relay(&self) -> Option<&RelaySession> {
        self.relay.as_ref()
    }

    /// Reserve below which station keeping is suspended.
    pub fn maintenance_threshold(&self) -> f64 {
        self.config.maintenance_fuel_percent * self.initial_reserve
    }

    /// Station keeping is enabled and fuel is above the maintenance threshold.
    pub fn is_station_keeping(&self) -> bool {
        self.config.maintain_current_orbit
            && !self.reserve.is_empty()
            && self.reserve.amount() >= self.maintenance_threshold()
    }
}

impl GravityAffected for Satellite {
    fn position(&self) -> DVec2 {
        self.position
    }

    fn velocity(&self) -> DVec2 {
        self.velocity
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn set_kinematics(&mut self, position: DVec2, velocity: DVec2) {
        self.position = position;
        self.velocity = velocity;
    }
}

/// One satellite network.
#[derive(Clone, Debug, PartialEq)]
pub struct SatelliteManager {
    config: SatelliteNetworkConfig,
    satellites: Arena<SatelliteId, Satellite>,
    nearby_rockets: Vec<RocketProbe>,
    links: Vec<(SatelliteId, SatelliteId)>,
    rocket_links: Vec<(VehicleManagerId, SatelliteId)>,
}

impl SatelliteManager {
    pub fn new(config: SatelliteNetworkConfig) -> Self {
        Self {
            config,
            satellites: Arena::new(),
            nearby_rockets: Vec::new(),
            links: Vec::new(),
            rocket_links: Vec::new(),
        }
    }

    pub fn config(&self) -> &SatelliteNetworkConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    pub fn get(&self, id: SatelliteId) -> Option<&Satellite> {
        self.satellites.get(id)
    }

    pub fn get_mut(&mut self, id: SatelliteId) -> Option<&mut Satellite> {
        self.satellites.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Satellite> {
        self.satellites.values()
    }

    pub(crate) fn satellites_mut(&mut self) -> impl Iterator<Item = &mut Satellite> {
        self.satellites.values_mut()
    }

    /// Raw value the next satellite id will use.
    pub fn next_id(&self) -> u32 {
        self.satellites.next_raw()
    }

    /// Total mass of the network; zero or negative masses make the network
    /// unregistrable.
    pub fn total_mass(&self) -> f64 {
        self.satellites.values().map(|s| s.mass).sum()
    }

    /// Create a satellite with the network's default mass and reserve.
    pub fn create_satellite(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        config: SatelliteConfig,
    ) -> Result<SatelliteId, SatelliteError> {
        let reserve = FuelTank::full(self.config.default_fuel_reserve);
        let mass = self.config.default_mass;
        self.create_satellite_with_reserve(position, velocity, mass, reserve, config)
    }

    /// Create a satellite carrying `reserve`. Nothing changes on error.
    pub fn create_satellite_with_reserve(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        mass: f64,
        reserve: FuelTank,
        config: SatelliteConfig,
    ) -> Result<SatelliteId, SatelliteError> {
        if self.satellites.len() >= self.config.max_satellites {
            return Err(SatelliteError::CapacityReached(self.config.max_satellites));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(SatelliteError::InvalidMass(mass));
        }
        let config = config.validated()?;

        let id = SatelliteId::from_raw(self.satellites.next_raw());
        let satellite = Satellite {
            id,
            position,
            velocity,
            mass,
            reserve,
            initial_reserve: reserve.amount(),
            config,
            target: None,
            relay: None,
        };
        let pushed = self.satellites.push(satellite);
        debug_assert_eq!(pushed, id);

        info!(
            "Created satellite {id} at ({:.1}, {:.1}) with {:.1} fuel",
            position.x,
            position.y,
            reserve.amount()
        );
        Ok(id)
    }

    /// Put back a saved satellite under its original id.
    pub(crate) fn restore_satellite(&mut self, satellite: Satellite) -> Result<(), SatelliteError> {
        if self.satellites.contains(satellite.id) {
            return Err(SatelliteError::DuplicateSatellite(satellite.id));
        }
        if self.satellites.len() >= self.config.max_satellites {
            return Err(SatelliteError::CapacityReached(self.config.max_satellites));
        }
        if !satellite.mass.is_finite() || satellite.mass <= 0.0 {
            return Err(SatelliteError::InvalidMass(satellite.mass));
        }
        self.satellites.insert(satellite.id, satellite);
        Ok(())
    }

    /// Never reuse ids below `next`, even if those satellites are gone.
    pub(crate) fn reserve_ids_through(&mut self, next: u32) {
        self.satellites.reserve_through(next);
    }

    /// Decommission a satellite. Relays pointing at it close on the next tick.
    pub fn remove_satellite(&mut self, id: SatelliteId) -> Option<Satellite> {
        let removed = self.satellites.remove(id)?;
        self.links.retain(|(a, b)| *a != id && *b != id);
        self.rocket_links.retain(|(_, s)| *s != id);
        info!("Removed satellite {id}");
        Some(removed)
    }

    /// Replace the rockets considered for relays this tick.
    pub fn set_nearby_rockets(&mut self, rockets: Vec<RocketProbe>) {
        self.nearby_rockets = rockets;
    }

    /// Open a relay from `owner` toward `partner`, replacing any open one.
    ///
    /// `direction` is seen from `owner`: `Out` pushes fuel to the partner.
    /// Fuel only flows while the two are linked.
    pub fn start_relay(
        &mut self,
        owner: SatelliteId,
        partner: SatelliteId,
        direction: TransferDirection,
        rate: f64,
    ) -> Result<(), SatelliteError> {
        if owner == partner {
            return Err(SatelliteError::SelfRelay(owner));
        }
        if !self.satellites.contains(partner) {
            return Err(SatelliteError::UnknownSatellite(partner));
        }
        let transfer = FuelTransfer::new(direction, rate).ok_or(SatelliteError::InvalidTransferRate(rate))?;
        let satellite = self
            .satellites
            .get_mut(owner)
            .ok_or(SatelliteError::UnknownSatellite(owner))?;
        satellite.relay = Some(RelaySession { partner, transfer });
        debug!("Satellite {owner} relaying {direction:?} with {partner} at {rate:.2}/s");
        Ok(())
    }

    /// Close the relay owned by `owner`. A no-op when none is open.
    pub fn stop_relay(&mut self, owner: SatelliteId) {
        if let Some(satellite) = self.satellites.get_mut(owner)
            && satellite.relay.take().is_some()
        {
            debug!("Satellite {owner} closed its relay");
        }
    }

    /// Satellite pairs within mutual range as of the last tick.
    pub fn links(&self) -> &[(SatelliteId, SatelliteId)] {
        &self.links
    }

    /// Rockets each within range of a satellite as of the last tick.
    pub fn rocket_links(&self) -> &[(VehicleManagerId, SatelliteId)] {
        &self.rocket_links
    }

    /// Rockets within range of `satellite` as of the last tick.
    pub fn rockets_in_range(&self, satellite: SatelliteId) -> Vec<VehicleManagerId> {
        self.rocket_links
            .iter()
            .filter(|(_, s)| *s == satellite)
            .map(|(m, _)| *m)
            .collect()
    }

    /// Closest satellite whose transfer range covers `position`.
    pub fn closest_in_range(&self, position: DVec2) -> Option<&Satellite> {
        relay::closest_in_range(&self.satellites, position).and_then(|id| self.satellites.get(id))
    }

    fn is_linked(&self, a: SatelliteId, b: SatelliteId) -> bool {
        let pair = if a < b { (a, b) } else { (b, a) };
        self.links.contains(&pair)
    }

    /// Advance the network by one tick.
    ///
    /// Order: refresh links, rocket relays, satellite relays, station keeping.
    /// Rocket fuel changes are returned for the caller to apply.
    pub fn update(&mut self, dt: f64, ctx: &TickContext) -> SatelliteTickReport {
        let mut report = SatelliteTickReport::default();
        self.refresh_links();

        if dt > 0.0 {
            self.relay_with_rockets(dt, &mut report);
            self.relay_between_satellites(dt);
        }
        self.station_keep(dt, ctx);

        report
    }

    fn refresh_links(&mut self) {
        self.links = relay::satellite_links(&self.satellites);
        self.rocket_links = self
            .nearby_rockets
            .iter()
            .flat_map(|probe| {
                self.satellites
                    .values()
                    .filter(|sat| relay::in_range(sat.position, probe.position, sat.config.transfer_range))
                    .map(move |sat| (probe.manager, sat.id))
            })
            .collect();
    }

    fn relay_with_rockets(&mut self, dt: f64, report: &mut SatelliteTickReport) {
        for probe in &self.nearby_rockets {
            let Some(transfer) = probe.transfer else {
                continue;
            };
            let Some(sat_id) = relay::closest_in_range(&self.satellites, probe.position) else {
                continue;
            };
            let Some(sat) = self.satellites.get_mut(sat_id) else {
                continue;
            };

            // Direction is the rocket's: In means the satellite is the source.
            let (source, room) = match transfer.direction {
                TransferDirection::In => (sat.reserve.amount(), probe.room()),
                TransferDirection::Out => (probe.fuel, sat.reserve.room()),
            };
            let amount = transfer.amount(dt, source, room);
            let delta = match transfer.direction {
                TransferDirection::In => sat.reserve.draw(amount),
                TransferDirection::Out => -sat.reserve.fill(amount),
            };
            let session_ended = source - amount <= 0.0 || room - amount <= 0.0;

            if session_ended {
                debug!("Relay between {} and satellite {sat_id} exhausted", probe.manager);
            }
            report.rocket_exchanges.push(RocketFuelExchange {
                manager: probe.manager,
                satellite: sat_id,
                delta,
                session_ended,
            });
        }
    }

    fn relay_between_satellites(&mut self, dt: f64) {
        let sessions: Vec<(SatelliteId, RelaySession)> = self
            .satellites
            .values()
            .filter_map(|s| s.relay.map(|r| (s.id, r)))
            .collect();

        for (owner, session) in sessions {
            if !self.satellites.contains(session.partner) {
                debug!("Satellite {owner} relay partner {} is gone", session.partner);
                self.stop_relay(owner);
                continue;
            }
            if !self.is_linked(owner, session.partner) {
                continue;
            }

            let (source_id, dest_id) = match session.transfer.direction {
                TransferDirection::Out => (owner, session.partner),
                TransferDirection::In => (session.partner, owner),
            };
            let (Some(source), Some(dest)) = (self.satellites.get(source_id), self.satellites.get(dest_id)) else {
                continue;
            };
            let available = source.reserve.amount();
            let room = dest.reserve.room();
            let amount = session.transfer.amount(dt, available, room);

            let moved = self
                .satellites
                .get_mut(source_id)
                .map_or(0.0, |s| s.reserve.draw(amount));
            if let Some(dest) = self.satellites.get_mut(dest_id) {
                dest.reserve.fill(moved);
            }

            if available - moved <= 0.0 || room - moved <= 0.0 {
                self.stop_relay(owner);
            }
        }
    }

    fn station_keep(&mut self, dt: f64, ctx: &TickContext) {
        let params = self.config.station_keeping_params();
        let g = ctx.gravitational_constant;

        for sat in self.satellites.values_mut() {
            if !sat.config.maintain_current_orbit {
                continue;
            }

            let target = match sat.target {
                Some(target) => target,
                None => {
                    let closest = orbit::find_closest_planet(sat.position, ctx.planets.iter().map(|p| (p, p.position)));
                    if let Some(closest) = closest {
                        sat.target = StationKeepingTarget::capture(closest.key, sat.position, sat.velocity, g);
                        if sat.target.is_some() {
                            debug!("Satellite {} captured orbit around {}", sat.id, closest.key.id);
                        }
                    }
                    continue;
                }
            };

            if !sat.is_station_keeping() {
                continue;
            }
            let Some(planet) = ctx.planets.iter().find(|p| p.id == target.planet) else {
                continue;
            };

            let correction = compute_correction(
                &target,
                planet,
                sat.position,
                sat.velocity,
                sat.reserve.amount(),
                sat.config.station_keeping_efficiency,
                &params,
                g,
                dt,
            );
            sat.velocity += correction.delta_v;
            sat.reserve.draw(correction.fuel_used);

            if !sat.is_station_keeping() {
                info!("Satellite {} reached its maintenance reserve, station keeping off", sat.id);
            }
        }
    }
}
