//! Headless Bevy integration tests.
//!
//! Drive the session through [`FlightPlugin`] without a window or GPU.

mod common;

use std::time::Duration;

use bevy::ecs::message::Messages;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use common::*;
use spaceflight::control::{FlightPlugin, SatelliteConversionResult, VehicleCommand, VehicleIntent};
use spaceflight::satellite::SatelliteConfig;
use spaceflight::session::GameSession;
use spaceflight::vehicle::{VehicleKind, VehicleState};

fn create_app(session: GameSession) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(session)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(DT)))
        .add_plugins(FlightPlugin);
    app
}

fn run_frames(app: &mut App, n: usize) {
    for _ in 0..n {
        app.update();
    }
}

#[test]
fn test_session_advances_when_running() {
    let mut world = orbiting_world(300.0);
    world.session.time.paused = false;
    let mut app = create_app(world.session);

    run_frames(&mut app, 30);

    let session = app.world().resource::<GameSession>();
    assert!(session.time.elapsed > 0.0, "simulation time should have advanced");
}

#[test]
fn test_paused_session_does_not_advance() {
    let mut world = orbiting_world(300.0);
    world.session.time.paused = true;
    let start = world.session.vehicle_manager(world.player).unwrap().position();
    let mut app = create_app(world.session);

    run_frames(&mut app, 30);

    let session = app.world().resource::<GameSession>();
    assert_eq!(session.time.elapsed, 0.0);
    assert_eq!(session.vehicle_manager(world.player).unwrap().position(), start);
}

#[test]
fn test_intents_reach_the_vehicle() {
    let mut world = orbiting_world(300.0);
    world.session.time.paused = true;
    let mut app = create_app(world.session);

    app.world_mut().write_message(VehicleIntent {
        target: world.player,
        command: VehicleCommand::Rotate(90.0),
    });
    app.world_mut().write_message(VehicleIntent {
        target: world.player,
        command: VehicleCommand::Thrust(0.75),
    });
    app.update();

    let session = app.world().resource::<GameSession>();
    let rocket = session.vehicle_manager(world.player).unwrap().active().unwrap();
    assert_eq!(rocket.rotation(), 90.0);
    assert_eq!(rocket.state(), VehicleState::Thrusting(0.75));
}

#[test]
fn test_rejected_intent_leaves_state_alone() {
    let mut world = orbiting_world(300.0);
    world.session.time.paused = true;
    let mut app = create_app(world.session);

    app.world_mut().write_message(VehicleIntent {
        target: world.player,
        command: VehicleCommand::StartTransferIn(-1.0),
    });
    app.update();

    let session = app.world().resource::<GameSession>();
    let rocket = session.vehicle_manager(world.player).unwrap().active().unwrap();
    assert_eq!(rocket.state(), VehicleState::Idle);
}

#[test]
fn test_conversion_intent_reports_result() {
    let mut world = orbiting_world(300.0);
    world.session.time.paused = true;
    let mut app = create_app(world.session);

    app.world_mut().write_message(VehicleIntent {
        target: world.player,
        command: VehicleCommand::ConvertToSatellite {
            network: world.network,
            config: SatelliteConfig::default(),
        },
    });
    app.update();

    let results: Vec<SatelliteConversionResult> = app
        .world_mut()
        .resource_mut::<Messages<SatelliteConversionResult>>()
        .drain()
        .collect();
    assert_eq!(results.len(), 1);
    let sat = results[0].result.clone().unwrap();

    let session = app.world().resource::<GameSession>();
    assert!(session.satellite_manager(world.network).unwrap().get(sat).is_some());
    assert!(session.vehicle_manager(world.player).unwrap().is_respawn_pending());
}

#[test]
fn test_switch_vehicle_intent() {
    let mut world = orbiting_world(300.0);
    world.session.time.paused = true;
    let mut app = create_app(world.session);

    app.world_mut().write_message(VehicleIntent {
        target: world.player,
        command: VehicleCommand::SwitchVehicle(VehicleKind::Car),
    });
    app.update();

    let session = app.world().resource::<GameSession>();
    let active = session.vehicle_manager(world.player).unwrap().active().unwrap();
    assert_eq!(active.kind(), VehicleKind::Car);
}
