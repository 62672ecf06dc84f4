//! Predefined starting setups.
//!
//! A [`Scenario`] is a static description of planets, where the player
//! starts, whether a satellite network is available, and how the clock and
//! camera begin. [`Scenario::build`] turns it into a populated
//! [`GameSession`].

pub mod presets;

use bevy::color::Srgba;
use bevy::log::info;
use bevy::math::DVec2;

use crate::arena::{PlanetId, SatelliteManagerId, VehicleManagerId};
use crate::celestial::CelestialBody;
use crate::physics::RegistrationError;
use crate::satellite::SatelliteManager;
use crate::session::{GameSession, SimulationConfig};
use crate::types::CameraState;
use crate::vehicle::{SpawnPoint, VehicleManager};

pub use presets::SCENARIOS;

/// How a preset planet moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PresetMotion {
    Fixed,
    /// Scripted circular orbit around the planet at this index of the same preset.
    Orbiting(usize),
    /// Integrated from this initial velocity.
    Dynamic(DVec2),
}

/// One planet of a scenario.
#[derive(Clone, Copy, Debug)]
pub struct PlanetPreset {
    pub name: &'static str,
    pub position: DVec2,
    pub mass: f64,
    pub radius: f64,
    pub color: Srgba,
    pub motion: PresetMotion,
    pub is_main_planet: bool,
}

/// Where the player's rocket starts, relative to the main planet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerStart {
    /// No player vehicle.
    None,
    /// Resting on top of the main planet.
    Surface,
    /// Counter-clockwise circular orbit at this altitude.
    Orbit { altitude: f64 },
}

/// Camera target for scenario initialization.
#[derive(Clone, Copy, Debug, Default)]
pub enum CameraTarget {
    /// Center on the main planet (default).
    #[default]
    MainPlanet,
    /// Center on the player's start.
    Player,
    /// Center on a fixed world position.
    Position(DVec2),
}

/// A predefined scenario configuration.
#[derive(Clone, Copy, Debug)]
pub struct Scenario {
    /// Unique identifier for the scenario.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Brief description of the scenario.
    pub description: &'static str,
    pub planets: &'static [PlanetPreset],
    pub player: PlayerStart,
    /// Start with an empty satellite network the player can convert into.
    pub satellite_network: bool,
    pub time_scale: f64,
    pub start_paused: bool,
    pub camera_target: CameraTarget,
    pub camera_zoom: f32,
}

/// Handles to what a scenario created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioHandles {
    /// In preset order
    pub planets: Vec<PlanetId>,
    pub player: Option<VehicleManagerId>,
    pub satellites: Option<SatelliteManagerId>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("scenario '{scenario}': planet {index} orbits planet {parent}, which is not defined before it")]
    BadParent {
        scenario: &'static str,
        index: usize,
        parent: usize,
    },

    #[error("scenario '{0}' places the player but has no main planet")]
    NoMainPlanet(&'static str),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Look up a preset by id.
pub fn find_scenario(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

impl Scenario {
    /// Build a fresh session for this scenario.
    pub fn build(&self, config: SimulationConfig) -> Result<(GameSession, ScenarioHandles), ScenarioError> {
        let mut session = GameSession::new(config);
        let mut handles = ScenarioHandles::default();

        for (index, preset) in self.planets.iter().enumerate() {
            let mut body = CelestialBody::new(preset.position, preset.mass, preset.radius, preset.color);
            body.is_main_planet = preset.is_main_planet;
            body = match preset.motion {
                PresetMotion::Fixed => body,
                PresetMotion::Orbiting(parent) => {
                    let Some(&parent_id) = handles.planets.get(parent) else {
                        return Err(ScenarioError::BadParent {
                            scenario: self.id,
                            index,
                            parent,
                        });
                    };
                    body.orbiting(parent_id)
                }
                PresetMotion::Dynamic(velocity) => body.dynamic(velocity),
            };
            handles.planets.push(session.add_planet(body)?);
        }

        let main = self.planets.iter().find(|p| p.is_main_planet);
        let spawn = match (self.player, main) {
            (PlayerStart::None, _) => None,
            (_, None) => return Err(ScenarioError::NoMainPlanet(self.id)),
            (PlayerStart::Surface, Some(main)) => Some(SpawnPoint {
                position: main.position + DVec2::new(0.0, main.radius),
                velocity: DVec2::ZERO,
                rotation: 0.0,
            }),
            (PlayerStart::Orbit { altitude }, Some(main)) => {
                let r = main.radius + altitude;
                let speed = (session.gravity().gravitational_constant() * main.mass / r).sqrt();
                Some(SpawnPoint {
                    position: main.position + DVec2::new(0.0, r),
                    velocity: DVec2::new(-speed, 0.0),
                    // Prograde: heading 270° points along -x
                    rotation: 270.0,
                })
            }
        };

        if let Some(spawn) = spawn {
            let vehicles = session.config().vehicles.clone();
            handles.player = Some(session.add_vehicle_manager(VehicleManager::new(spawn, vehicles))?);
        }
        if self.satellite_network {
            let network = SatelliteManager::new(session.config().satellites.clone());
            handles.satellites = Some(session.add_satellite_manager(network)?);
        }

        session.time.scale = self.time_scale;
        session.time.paused = self.start_paused;
        let center = match self.camera_target {
            CameraTarget::MainPlanet => main.map_or(DVec2::ZERO, |p| p.position),
            CameraTarget::Player => spawn.map_or(DVec2::ZERO, |s| s.position),
            CameraTarget::Position(position) => position,
        };
        session.camera = CameraState {
            center: [center.x, center.y],
            zoom: self.camera_zoom,
        };

        info!("Loaded scenario '{}' with {} planets", self.name, handles.planets.len());
        Ok((session, handles))
    }
}

impl GameSession {
    /// Build a session from a preset scenario.
    pub fn from_scenario(
        scenario: &Scenario,
        config: SimulationConfig,
    ) -> Result<(Self, ScenarioHandles), ScenarioError> {
        scenario.build(config)
    }
}
