//! Bevy integration.
//!
//! [`FlightPlugin`] keeps a [`GameSession`] resource, turns
//! [`VehicleIntent`] messages from the control layer into calls on the
//! vehicle managers, and steps the session in `FixedUpdate` scaled by the
//! session clock.

use bevy::prelude::*;

use crate::arena::{SatelliteId, SatelliteManagerId, VehicleManagerId};
use crate::satellite::SatelliteConversionConfig;
use crate::session::GameSession;
use crate::vehicle::{ConversionError, VehicleError, VehicleKind};

/// Plugin providing the simulation loop.
///
/// Inserts a default [`GameSession`] unless one is already present.
pub struct FlightPlugin;

impl Plugin for FlightPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameSession>()
            .add_message::<VehicleIntent>()
            .add_message::<SatelliteConversionResult>()
            .add_systems(Update, apply_vehicle_intents)
            .add_systems(FixedUpdate, step_session);
    }
}

/// A discrete control command for one vehicle manager.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct VehicleIntent {
    pub target: VehicleManagerId,
    pub command: VehicleCommand,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VehicleCommand {
    /// Signed level in [-1, 1]; 0 cuts the engine
    Thrust(f64),
    /// Degrees, clockwise positive
    Rotate(f64),
    StartTransferIn(f64),
    StartTransferOut(f64),
    StopTransfer,
    SwitchVehicle(VehicleKind),
    ConvertToSatellite {
        network: SatelliteManagerId,
        config: SatelliteConversionConfig,
    },
}

/// Outcome of a conversion request, for UI feedback.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct SatelliteConversionResult {
    pub vehicles: VehicleManagerId,
    pub result: Result<SatelliteId, ConversionError>,
}

fn apply_vehicle_intents(
    mut intents: MessageReader<VehicleIntent>,
    mut results: MessageWriter<SatelliteConversionResult>,
    mut session: ResMut<GameSession>,
) {
    for intent in intents.read() {
        if let VehicleCommand::ConvertToSatellite { network, config } = &intent.command {
            let result = session.request_satellite_conversion(intent.target, *network, config.clone());
            results.write(SatelliteConversionResult {
                vehicles: intent.target,
                result,
            });
            continue;
        }

        let Some(manager) = session.vehicle_manager_mut(intent.target) else {
            warn!("Intent for unknown vehicle manager {}", intent.target);
            continue;
        };
        let outcome: Result<(), VehicleError> = match intent.command {
            VehicleCommand::Thrust(level) => manager.apply_thrust(level),
            VehicleCommand::Rotate(delta) => manager.rotate(delta),
            VehicleCommand::StartTransferIn(rate) => manager.start_fuel_transfer_in(rate),
            VehicleCommand::StartTransferOut(rate) => manager.start_fuel_transfer_out(rate),
            VehicleCommand::StopTransfer => {
                manager.stop_fuel_transfer();
                Ok(())
            }
            VehicleCommand::SwitchVehicle(kind) => manager.switch_vehicle(kind),
            VehicleCommand::ConvertToSatellite { .. } => Ok(()),
        };
        if let Err(err) = outcome {
            warn!("Rejected {:?} for {}: {err}", intent.command, intent.target);
        }
    }
}

/// Step the session by one fixed frame, honouring pause and time scale.
fn step_session(mut session: ResMut<GameSession>, time: Res<Time>) {
    session.step(time.delta_secs_f64());
}
