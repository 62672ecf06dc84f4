//! Spaceflight - 2D orbital flight simulation core
//!
//! Gravity integration for planets, player vehicles and satellites, the
//! orbital analytics that feed telemetry, the vehicle fuel/thrust state
//! machine, satellite networks with station keeping and fuel relays, and
//! save/restore snapshots.

pub mod arena;
pub mod celestial;
pub mod control;
pub mod fuel;
pub mod orbit;
pub mod physics;
pub mod satellite;
pub mod scenarios;
pub mod session;
pub mod snapshot;
pub mod types;
pub mod vehicle;

#[cfg(test)]
pub mod test_utils;
