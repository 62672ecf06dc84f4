//! Preset scenario definitions.
//!
//! Five starting setups, from a single planet up to a binary pair with a
//! rogue planet passing through.

use bevy::color::Srgba;
use bevy::math::DVec2;

use super::{CameraTarget, PlanetPreset, PlayerStart, PresetMotion, Scenario};

/// All available preset scenarios.
pub static SCENARIOS: &[Scenario] = &[HOME_ORBIT, LAUNCHPAD, BINARY_SYSTEM, ROGUE_FLYBY, SANDBOX];

const HOME_MASS: f64 = 5.972e7;
const HOME_RADIUS: f64 = 100.0;
const HOME_COLOR: Srgba = Srgba::new(0.2, 0.45, 0.9, 1.0);
const MOON_COLOR: Srgba = Srgba::new(0.7, 0.7, 0.72, 1.0);

const HOME: PlanetPreset = PlanetPreset {
    name: "Home",
    position: DVec2::ZERO,
    mass: HOME_MASS,
    radius: HOME_RADIUS,
    color: HOME_COLOR,
    motion: PresetMotion::Fixed,
    is_main_planet: true,
};

const MOON: PlanetPreset = PlanetPreset {
    name: "Moon",
    position: DVec2::new(1500.0, 0.0),
    mass: 7.3e5,
    radius: 27.0,
    color: MOON_COLOR,
    motion: PresetMotion::Orbiting(0),
    is_main_planet: false,
};

static HOME_AND_MOON: &[PlanetPreset] = &[HOME, MOON];

/// Scenario 1: Home Orbit (Default/Tutorial)
///
/// Rocket already in a low circular orbit, moon on a scripted orbit further
/// out. Good for trying burns and converting a first satellite.
pub static HOME_ORBIT: Scenario = Scenario {
    id: "home_orbit",
    name: "Home Orbit",
    description: "Start in low orbit around the home planet. Tutorial scenario.",
    planets: HOME_AND_MOON,
    player: PlayerStart::Orbit { altitude: 200.0 },
    satellite_network: true,
    time_scale: 1.0,
    start_paused: true,
    camera_target: CameraTarget::MainPlanet,
    camera_zoom: 1.0,
};

/// Scenario 2: Launchpad
///
/// Rocket resting on the surface; reaching orbit is up to the player.
pub static LAUNCHPAD: Scenario = Scenario {
    id: "launchpad",
    name: "Launchpad",
    description: "Sitting on the surface. Get to orbit.",
    planets: HOME_AND_MOON,
    player: PlayerStart::Surface,
    satellite_network: true,
    time_scale: 1.0,
    start_paused: false,
    camera_target: CameraTarget::Player,
    camera_zoom: 0.5,
};

static BINARY_PLANETS: &[PlanetPreset] = &[
    PlanetPreset {
        name: "Primary",
        position: DVec2::ZERO,
        mass: HOME_MASS,
        radius: 90.0,
        color: HOME_COLOR,
        motion: PresetMotion::Fixed,
        is_main_planet: true,
    },
    PlanetPreset {
        name: "Secondary",
        position: DVec2::new(1200.0, 0.0),
        mass: 2.0e7,
        radius: 70.0,
        color: Srgba::new(0.85, 0.5, 0.25, 1.0),
        motion: PresetMotion::Orbiting(0),
        is_main_planet: false,
    },
];

/// Scenario 3: Binary System
///
/// A heavy secondary on a scripted orbit. Transfers between the two are
/// strongly perturbed.
pub static BINARY_SYSTEM: Scenario = Scenario {
    id: "binary_system",
    name: "Binary System",
    description: "Two large planets. Orbits near the secondary get messy.",
    planets: BINARY_PLANETS,
    player: PlayerStart::Orbit { altitude: 150.0 },
    satellite_network: true,
    time_scale: 2.0,
    start_paused: true,
    camera_target: CameraTarget::Position(DVec2::new(600.0, 0.0)),
    camera_zoom: 2.0,
};

static ROGUE_PLANETS: &[PlanetPreset] = &[
    HOME,
    PlanetPreset {
        name: "Rogue",
        position: DVec2::new(-4000.0, 1200.0),
        mass: 2.0e6,
        radius: 40.0,
        color: Srgba::new(0.6, 0.2, 0.3, 1.0),
        motion: PresetMotion::Dynamic(DVec2::new(60.0, 0.0)),
        is_main_planet: false,
    },
];

/// Scenario 4: Rogue Flyby
///
/// A free-flying planet falls past the home planet while the rocket orbits.
pub static ROGUE_FLYBY: Scenario = Scenario {
    id: "rogue_flyby",
    name: "Rogue Flyby",
    description: "A rogue planet passes close by. Keep your orbit.",
    planets: ROGUE_PLANETS,
    player: PlayerStart::Orbit { altitude: 250.0 },
    satellite_network: true,
    time_scale: 4.0,
    start_paused: true,
    camera_target: CameraTarget::MainPlanet,
    camera_zoom: 3.0,
};

static SANDBOX_PLANETS: &[PlanetPreset] = &[HOME];

/// Scenario 5: Sandbox
///
/// One planet, one rocket, no moon.
pub static SANDBOX: Scenario = Scenario {
    id: "sandbox",
    name: "Sandbox",
    description: "A single planet and a rocket in orbit. Experiment freely.",
    planets: SANDBOX_PLANETS,
    player: PlayerStart::Orbit { altitude: 200.0 },
    satellite_network: true,
    time_scale: 1.0,
    start_paused: false,
    camera_target: CameraTarget::MainPlanet,
    camera_zoom: 1.0,
};
