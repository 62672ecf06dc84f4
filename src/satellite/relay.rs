//! Range checks for satellite links and rocket relays.

use bevy::math::DVec2;

use crate::arena::{Arena, SatelliteId, VehicleManagerId};
use crate::fuel::FuelTransfer;

use super::Satellite;

/// What a satellite manager sees of a nearby rocket this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RocketProbe {
    pub manager: VehicleManagerId,
    pub position: DVec2,
    pub fuel: f64,
    pub max_fuel: f64,
    /// Open session on the rocket, if any
    pub transfer: Option<FuelTransfer>,
}

impl RocketProbe {
    pub fn room(&self) -> f64 {
        (self.max_fuel - self.fuel).max(0.0)
    }
}

/// Fuel moved between a rocket and a satellite in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RocketFuelExchange {
    pub manager: VehicleManagerId,
    pub satellite: SatelliteId,
    /// Change to apply to the rocket's tank; positive means the rocket gains
    pub delta: f64,
    /// Source emptied or destination filled; the rocket should close its session
    pub session_ended: bool,
}

/// Everything a satellite manager tick produced for the outside world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SatelliteTickReport {
    pub rocket_exchanges: Vec<RocketFuelExchange>,
}

#[inline]
pub fn in_range(a: DVec2, b: DVec2, range: f64) -> bool {
    a.distance_squared(b) <= range * range
}

/// All satellite pairs within mutual range, as `(lower id, higher id)`.
///
/// Two satellites link when their distance is within the shorter of their
/// two transfer ranges.
pub fn satellite_links(satellites: &Arena<SatelliteId, Satellite>) -> Vec<(SatelliteId, SatelliteId)> {
    let entries: Vec<&Satellite> = satellites.values().collect();
    let mut links = Vec::new();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            let range = a.config.transfer_range.min(b.config.transfer_range);
            if in_range(a.position, b.position, range) {
                links.push((a.id, b.id));
            }
        }
    }
    links
}

/// Closest satellite whose own transfer range covers `position`.
pub fn closest_in_range(satellites: &Arena<SatelliteId, Satellite>, position: DVec2) -> Option<SatelliteId> {
    let mut best: Option<(SatelliteId, f64)> = None;
    for sat in satellites.values() {
        let d2 = sat.position.distance_squared(position);
        let range = sat.config.transfer_range;
        if d2 > range * range {
            continue;
        }
        if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
            best = Some((sat.id, d2));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_inclusive() {
        assert!(in_range(DVec2::ZERO, DVec2::new(3.0, 4.0), 5.0));
        assert!(!in_range(DVec2::ZERO, DVec2::new(3.0, 4.0), 4.99));
    }

    #[test]
    fn test_probe_room() {
        let probe = RocketProbe {
            manager: crate::arena::IdLike::from_raw(0),
            position: DVec2::ZERO,
            fuel: 70.0,
            max_fuel: 100.0,
            transfer: None,
        };
        assert_eq!(probe.room(), 30.0);
    }
}
