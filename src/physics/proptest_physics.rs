//! Property-based tests for the integrator, the orbit analytics and the
//! vehicle fuel state machine.

use bevy::math::DVec2;
use proptest::prelude::*;

use super::{compute_acceleration_from_sources, symplectic_euler_step};
use crate::orbit::{Apsis, OrbitShape};
use crate::test_utils::{PLANET_MASS, assertions, fixtures};
use crate::types::{FIXED_DT, G, MIN_SEPARATION};
use crate::vehicle::{SpawnPoint, VehicleConfig, VehicleKind, VehicleManager};

#[derive(Clone, Debug)]
enum Command {
    Thrust(f64),
    Rotate(f64),
    TransferIn(f64),
    TransferOut(f64),
    StopTransfer,
    Switch(VehicleKind),
    Receive(f64),
    Tick(u8),
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (-2.0f64..2.0).prop_map(Command::Thrust),
        (-720.0f64..720.0).prop_map(Command::Rotate),
        (0.0f64..50.0).prop_map(Command::TransferIn),
        (0.0f64..50.0).prop_map(Command::TransferOut),
        Just(Command::StopTransfer),
        prop_oneof![Just(VehicleKind::Rocket), Just(VehicleKind::Car)].prop_map(Command::Switch),
        (-500.0f64..500.0).prop_map(Command::Receive),
        (1u8..120).prop_map(Command::Tick),
    ]
}

/// Integrate around the fixture planet at the origin.
fn propagate(mut pos: DVec2, mut vel: DVec2, dt: f64, steps: usize) -> (DVec2, DVec2) {
    let sources = [(DVec2::ZERO, PLANET_MASS)];
    for _ in 0..steps {
        let acc = compute_acceleration_from_sources(pos, &sources, G, MIN_SEPARATION);
        (pos, vel) = symplectic_euler_step(pos, vel, acc, dt);
    }
    (pos, vel)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Fuel never leaves [0, max_fuel] whatever the player does.
    #[test]
    fn prop_fuel_stays_in_tank(commands in prop::collection::vec(command(), 1..60)) {
        let mut manager = VehicleManager::new(SpawnPoint::default(), VehicleConfig::default());
        for command in commands {
            // Rejections are fine; only the tank bounds matter here
            let _ = match command {
                Command::Thrust(level) => manager.apply_thrust(level),
                Command::Rotate(delta) => manager.rotate(delta),
                Command::TransferIn(rate) => manager.start_fuel_transfer_in(rate),
                Command::TransferOut(rate) => manager.start_fuel_transfer_out(rate),
                Command::StopTransfer => {
                    manager.stop_fuel_transfer();
                    Ok(())
                }
                Command::Switch(kind) => manager.switch_vehicle(kind),
                Command::Receive(delta) => {
                    manager.receive_fuel(delta);
                    Ok(())
                }
                Command::Tick(n) => {
                    for _ in 0..n {
                        manager.update(FIXED_DT);
                    }
                    Ok(())
                }
            };
            let vehicle = manager.active().unwrap();
            prop_assert!(vehicle.fuel() >= 0.0);
            prop_assert!(vehicle.fuel() <= vehicle.max_fuel());
            prop_assert!(vehicle.thrust_level().abs() <= 1.0);
        }
    }

    /// Bound orbits have periapsis <= apoapsis, both positive.
    #[test]
    fn prop_periapsis_below_apoapsis(
        r_p in 120.0f64..2000.0,
        eccentricity in 0.0f64..0.95,
        angle in 0.0f64..std::f64::consts::TAU,
    ) {
        let state = fixtures::elliptical_orbit(r_p, eccentricity);
        let rot = DVec2::from_angle(angle);
        let pos = rot.rotate(state.pos);
        let vel = rot.rotate(state.vel);

        let shape = OrbitShape::from_state(pos, vel, PLANET_MASS, G).unwrap();
        let (Apsis::Distance(peri), Apsis::Distance(apo)) = (shape.periapsis(), shape.apoapsis()) else {
            return Err(TestCaseError::fail("bound orbit reported as unbound"));
        };
        prop_assert!(peri > 0.0);
        prop_assert!(peri <= apo * (1.0 + 1e-9));
        prop_assert!((peri - r_p).abs() / r_p < 1e-6, "periapsis {} vs {}", peri, r_p);
    }

    /// Anything at or above escape speed has no apoapsis.
    #[test]
    fn prop_escape_speed_is_unbound(r in 120.0f64..5000.0, factor in 1.001f64..3.0) {
        let v = (2.0 * G * PLANET_MASS / r).sqrt() * factor;
        let shape = OrbitShape::from_state(DVec2::new(r, 0.0), DVec2::new(0.0, v), PLANET_MASS, G).unwrap();
        prop_assert_eq!(shape.apoapsis(), Apsis::Unbound);
    }

    /// Symplectic Euler keeps the energy of a circular orbit close over
    /// several periods at the fixed frame step.
    #[test]
    fn prop_circular_energy_bounded(r in 300.0f64..1500.0) {
        let state = fixtures::circular_orbit(r);
        let initial = assertions::orbital_energy(state.pos, state.vel);
        let period = assertions::orbital_period(r);
        let steps = (3.0 * period / FIXED_DT) as usize;

        let (pos, vel) = propagate(state.pos, state.vel, FIXED_DT, steps);
        let drift = ((assertions::orbital_energy(pos, vel) - initial) / initial).abs();
        prop_assert!(drift < 0.01, "energy drift {:.4}% at r={}", drift * 100.0, r);
    }

    /// A central force leaves angular momentum unchanged.
    #[test]
    fn prop_angular_momentum_conserved(r_p in 150.0f64..1000.0, eccentricity in 0.0f64..0.6) {
        let state = fixtures::elliptical_orbit(r_p, eccentricity);
        let initial = assertions::angular_momentum(state.pos, state.vel);
        let (pos, vel) = propagate(state.pos, state.vel, FIXED_DT, 2000);
        let drift = ((assertions::angular_momentum(pos, vel) - initial) / initial).abs();
        prop_assert!(drift < 1e-9, "angular momentum drift {}", drift);
    }
}
