//! Vehicle tuning and spawn configuration.

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

/// Discriminant of the active vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    Rocket,
    /// Ground vehicle. Same physics, weaker engine, cannot become a satellite.
    Car,
}

impl VehicleKind {
    pub fn name(&self) -> &'static str {
        match self {
            VehicleKind::Rocket => "rocket",
            VehicleKind::Car => "car",
        }
    }
}

/// Engine and tank figures for one vehicle kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    /// Tank capacity (fuel units)
    pub max_fuel: f64,
    /// Fuel per second at full thrust
    pub burn_rate: f64,
    /// Force at full thrust
    pub max_thrust: f64,
    /// Mass with an empty tank
    pub dry_mass: f64,
    /// Mass per fuel unit
    pub fuel_density: f64,
}

impl VehicleSpec {
    /// Default rocket tuning.
    pub fn rocket() -> Self {
        Self {
            max_fuel: 100.0,
            burn_rate: 10.0,
            max_thrust: 2000.0,
            dry_mass: 80.0,
            fuel_density: 0.2,
        }
    }

    /// Default ground vehicle tuning.
    pub fn car() -> Self {
        Self {
            max_fuel: 40.0,
            burn_rate: 2.0,
            max_thrust: 300.0,
            dry_mass: 40.0,
            fuel_density: 0.2,
        }
    }

    /// Total mass carrying `fuel` units.
    pub fn mass_with_fuel(&self, fuel: f64) -> f64 {
        self.dry_mass + fuel.max(0.0) * self.fuel_density
    }
}

/// Where fresh vehicles appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPoint {
    pub position: DVec2,
    pub velocity: DVec2,
    /// Heading in degrees
    pub rotation: f64,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            rotation: 0.0,
        }
    }
}

/// Vehicle configuration for a session.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleConfig {
    pub rocket: VehicleSpec,
    pub car: VehicleSpec,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            rocket: VehicleSpec::rocket(),
            car: VehicleSpec::car(),
        }
    }
}

impl VehicleConfig {
    pub fn spec_for(&self, kind: VehicleKind) -> VehicleSpec {
        match kind {
            VehicleKind::Rocket => self.rocket,
            VehicleKind::Car => self.car,
        }
    }
}
