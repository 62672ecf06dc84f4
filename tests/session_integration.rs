//! End-to-end tests: conversion, relays and save/restore through RON.

mod common;

use approx::assert_relative_eq;
use bevy::math::DVec2;
use common::*;
use spaceflight::arena::IdLike;
use spaceflight::fuel::TransferDirection;
use spaceflight::satellite::SatelliteConfig;
use spaceflight::session::{GameSession, SimulationConfig};
use spaceflight::snapshot::SimulationSnapshot;
use spaceflight::vehicle::{ConversionError, VehicleKind};

fn total_fuel(world: &TestWorld) -> f64 {
    let rocket = world
        .session
        .vehicle_manager(world.player)
        .and_then(|m| m.active())
        .map_or(0.0, |v| v.fuel());
    let satellites: f64 = world
        .session
        .satellite_manager(world.network)
        .unwrap()
        .iter()
        .map(|s| s.fuel())
        .sum();
    rocket + satellites
}

#[test]
fn test_converted_satellite_inherits_rocket_state() {
    let mut world = orbiting_world(300.0);
    let manager = world.session.vehicle_manager_mut(world.player).unwrap();
    manager.apply_thrust(1.0).unwrap();
    world.session.tick(DT);
    world.session.vehicle_manager_mut(world.player).unwrap().apply_thrust(0.0).unwrap();

    let rocket = world.session.vehicle_manager(world.player).unwrap().active().unwrap().clone();
    let sat = world
        .session
        .request_satellite_conversion(world.player, world.network, SatelliteConfig::default())
        .unwrap();

    let satellite = world.session.satellite_manager(world.network).unwrap().get(sat).unwrap();
    assert_eq!(satellite.position, rocket.position);
    assert_eq!(satellite.velocity, rocket.velocity);
    assert_relative_eq!(satellite.mass(), rocket.mass());
    assert_relative_eq!(satellite.fuel(), rocket.fuel());
    assert_eq!(satellite.name(), format!("SAT-{}", sat.into_raw()));
}

#[test]
fn test_car_cannot_become_satellite() {
    let mut world = orbiting_world(300.0);
    world
        .session
        .vehicle_manager_mut(world.player)
        .unwrap()
        .switch_vehicle(VehicleKind::Car)
        .unwrap();

    let result = world
        .session
        .request_satellite_conversion(world.player, world.network, SatelliteConfig::default());
    assert_eq!(result, Err(ConversionError::NotARocket(VehicleKind::Car)));
    assert!(world.session.satellite_manager(world.network).unwrap().is_empty());
}

#[test]
fn test_satellite_keeps_orbiting_after_conversion() {
    let mut world = orbiting_world(300.0);
    let sat = world
        .session
        .request_satellite_conversion(world.player, world.network, SatelliteConfig::default())
        .unwrap();

    run_ticks(&mut world.session, 600);

    let satellite = world.session.satellite_manager(world.network).unwrap().get(sat).unwrap();
    let r = satellite.position.length();
    assert!((r - 300.0).abs() / 300.0 < 0.01, "satellite drifted to r={r}");
    assert!(satellite.station_keeping_target().is_some());
}

#[test]
fn test_fuel_conserved_across_rocket_and_satellite_relays() {
    let mut world = orbiting_world(300.0);
    let network = world.session.satellite_manager_mut(world.network).unwrap();
    let a = network
        .create_satellite(DVec2::new(300.0, 0.0), DVec2::new(0.0, circular_speed(300.0)), quiet())
        .unwrap();
    let b = network
        .create_satellite(DVec2::new(300.0, 20.0), DVec2::new(0.0, circular_speed(300.0)), quiet())
        .unwrap();
    network.start_relay(a, b, TransferDirection::Out, 4.0).unwrap();

    let manager = world.session.vehicle_manager_mut(world.player).unwrap();
    manager.receive_fuel(-40.0);
    manager.start_fuel_transfer_in(8.0).unwrap();

    let before = total_fuel(&world);
    run_ticks(&mut world.session, 120);
    let after = total_fuel(&world);

    assert_relative_eq!(before, after, max_relative = 1e-12);
    let rocket = world.session.vehicle_manager(world.player).unwrap().active().unwrap();
    assert!(rocket.fuel() > 60.0, "rocket took on fuel: {}", rocket.fuel());
}

#[test]
fn test_snapshot_survives_ron_round_trip() {
    let mut world = orbiting_world(300.0);
    world
        .session
        .request_satellite_conversion(world.player, world.network, SatelliteConfig::default())
        .unwrap();
    run_ticks(&mut world.session, 30);
    world.session.vehicle_manager_mut(world.player).unwrap().rotate(45.0).unwrap();
    world.session.vehicle_manager_mut(world.player).unwrap().apply_thrust(0.5).unwrap();

    let snapshot = world.session.snapshot();
    let text = ron::to_string(&snapshot).unwrap();
    let parsed: SimulationSnapshot = ron::from_str(&text).unwrap();
    assert_eq!(parsed, snapshot);

    let mut restored = GameSession::restore(&parsed, SimulationConfig::default()).unwrap();
    for _ in 0..30 {
        world.session.tick(DT);
        restored.tick(DT);
    }
    assert_eq!(restored.snapshot(), world.session.snapshot());
}

#[test]
fn test_malformed_snapshot_is_rejected() {
    let world = orbiting_world(300.0);
    let mut snapshot = world.session.snapshot();
    snapshot.elapsed_time = f64::NAN;
    assert!(snapshot.restore(SimulationConfig::default()).is_err());
}

/// Satellites that hold their fuel for relays.
fn quiet() -> SatelliteConfig {
    SatelliteConfig {
        maintain_current_orbit: false,
        ..SatelliteConfig::default()
    }
}
