//! Spaceflight - headless simulation runner
//!
//! Loads a preset scenario and runs it at 60 Hz, logging the player's
//! telemetry once per simulated second.
//!
//! Usage: `spaceflight [scenario-id] [seconds]`

use std::time::Duration;

use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::log::LogPlugin;
use bevy::prelude::*;

use spaceflight::arena::VehicleManagerId;
use spaceflight::control::FlightPlugin;
use spaceflight::orbit::Apsis;
use spaceflight::scenarios::{SCENARIOS, find_scenario};
use spaceflight::session::{GameSession, SimulationConfig};
use spaceflight::types::FIXED_DT;

/// Player handle and run length.
#[derive(Resource)]
struct RunState {
    player: Option<VehicleManagerId>,
    duration: f64,
    next_report: f64,
}

fn main() -> AppExit {
    let mut args = std::env::args().skip(1);
    let scenario_id = args.next().unwrap_or_else(|| "home_orbit".to_string());
    let duration = args.next().and_then(|s| s.parse::<f64>().ok()).unwrap_or(30.0);

    let Some(scenario) = find_scenario(&scenario_id) else {
        let known: Vec<&str> = SCENARIOS.iter().map(|s| s.id).collect();
        eprintln!("Unknown scenario '{scenario_id}'. Available: {}", known.join(", "));
        return AppExit::error();
    };

    let (mut session, handles) = match GameSession::from_scenario(scenario, SimulationConfig::default()) {
        Ok(built) => built,
        Err(err) => {
            eprintln!("Failed to build scenario '{scenario_id}': {err}");
            return AppExit::error();
        }
    };
    session.time.paused = false;

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(FIXED_DT))),
            LogPlugin::default(),
        ))
        .insert_resource(session)
        .insert_resource(RunState {
            player: handles.player,
            duration,
            next_report: 0.0,
        })
        .add_plugins(FlightPlugin)
        .add_systems(Update, report_telemetry)
        .run()
}

fn report_telemetry(session: Res<GameSession>, mut run: ResMut<RunState>, mut exit: MessageWriter<AppExit>) {
    let t = session.time.elapsed;
    if t >= run.duration {
        exit.write(AppExit::Success);
        return;
    }
    if t < run.next_report {
        return;
    }
    run.next_report = t.floor() + 1.0;

    let Some(telemetry) = run.player.and_then(|id| session.telemetry(id)) else {
        info!("t={t:.1}s  no active vehicle");
        return;
    };
    let fmt = |apsis: Apsis| match apsis {
        Apsis::Distance(d) => format!("{d:.1}"),
        Apsis::Unbound => "unbound".to_string(),
    };
    info!(
        "t={t:.1}s  alt={:.1}  speed={:.2}  apo={}  peri={}  fuel={:.1}",
        telemetry.altitude,
        telemetry.speed,
        fmt(telemetry.apoapsis),
        fmt(telemetry.periapsis),
        telemetry.fuel
    );
}
