//! Shared helpers for integration tests.
#![allow(dead_code)]

use bevy::color::Srgba;
use bevy::math::DVec2;
use spaceflight::arena::{PlanetId, SatelliteManagerId, VehicleManagerId};
use spaceflight::celestial::CelestialBody;
use spaceflight::satellite::SatelliteManager;
use spaceflight::session::GameSession;
use spaceflight::types::G;
use spaceflight::vehicle::{SpawnPoint, VehicleConfig, VehicleManager};

pub const PLANET_MASS: f64 = 5.972e7;
pub const PLANET_RADIUS: f64 = 100.0;
pub const DT: f64 = 1.0 / 60.0;

/// Circular orbital speed at distance `r` from the test planet.
pub fn circular_speed(r: f64) -> f64 {
    (G * PLANET_MASS / r).sqrt()
}

/// Specific orbital energy relative to a planet at the origin.
pub fn orbital_energy(pos: DVec2, vel: DVec2) -> f64 {
    0.5 * vel.length_squared() - G * PLANET_MASS / pos.length()
}

pub struct TestWorld {
    pub session: GameSession,
    pub planet: PlanetId,
    pub player: VehicleManagerId,
    pub network: SatelliteManagerId,
}

/// One fixed main planet at the origin, a rocket on a counter-clockwise
/// circular orbit of radius `r`, and an empty satellite network.
pub fn orbiting_world(r: f64) -> TestWorld {
    let mut session = GameSession::default();
    let planet = session
        .add_planet(CelestialBody::new(DVec2::ZERO, PLANET_MASS, PLANET_RADIUS, Srgba::rgb(0.2, 0.45, 0.9)).main_planet())
        .unwrap();
    let spawn = SpawnPoint {
        position: DVec2::new(r, 0.0),
        velocity: DVec2::new(0.0, circular_speed(r)),
        rotation: 0.0,
    };
    let player = session
        .add_vehicle_manager(VehicleManager::new(spawn, VehicleConfig::default()))
        .unwrap();
    let network = session
        .add_satellite_manager(SatelliteManager::new(session.config().satellites.clone()))
        .unwrap();
    TestWorld {
        session,
        planet,
        player,
        network,
    }
}

pub fn run_ticks(session: &mut GameSession, n: usize) {
    for _ in 0..n {
        session.tick(DT);
    }
}
