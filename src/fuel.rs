//! Fuel tanks and rate-bounded transfer sessions.
//!
//! Vehicles and satellites share this model: a tank that can never leave
//! `[0, capacity]`, and a transfer session that moves at most `rate·dt` per
//! tick and only what the source has and the destination can hold.

use serde::{Deserialize, Serialize};

/// Direction of a transfer, seen from the entity that owns the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Fuel flows into the session owner.
    In,
    /// Fuel flows out of the session owner.
    Out,
}

/// An active transfer session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelTransfer {
    pub direction: TransferDirection,
    /// Fuel units per second
    pub rate: f64,
}

impl FuelTransfer {
    /// Returns `None` unless `rate` is positive and finite.
    pub fn new(direction: TransferDirection, rate: f64) -> Option<Self> {
        (rate > 0.0 && rate.is_finite()).then_some(Self { direction, rate })
    }

    /// Amount this session may move in one tick.
    pub fn amount(&self, dt: f64, source_available: f64, destination_room: f64) -> f64 {
        transfer_amount(self.rate, dt, source_available, destination_room)
    }
}

/// Amount moved in one tick: `min(rate·dt, source, room)`, never negative.
#[inline]
pub fn transfer_amount(rate: f64, dt: f64, source_available: f64, destination_room: f64) -> f64 {
    (rate * dt).min(source_available).min(destination_room).max(0.0)
}

/// A fuel store clamped to `[0, capacity]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelTank {
    amount: f64,
    capacity: f64,
}

impl FuelTank {
    /// Full tank.
    pub fn full(capacity: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            amount: capacity,
            capacity,
        }
    }

    /// Tank holding `amount`, clamped into range.
    pub fn with_amount(amount: f64, capacity: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            amount: amount.clamp(0.0, capacity),
            capacity,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Remaining room before the tank is full.
    pub fn room(&self) -> f64 {
        self.capacity - self.amount
    }

    pub fn is_empty(&self) -> bool {
        self.amount <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.amount >= self.capacity
    }

    /// Fill fraction in [0, 1]; an empty-capacity tank reports 0.
    pub fn fraction(&self) -> f64 {
        if self.capacity > 0.0 {
            self.amount / self.capacity
        } else {
            0.0
        }
    }

    /// Remove up to `requested`, returning how much was actually drawn.
    pub fn draw(&mut self, requested: f64) -> f64 {
        let drawn = requested.max(0.0).min(self.amount);
        self.amount -= drawn;
        if self.amount < 0.0 {
            self.amount = 0.0;
        }
        drawn
    }

    /// Add up to `offered`, returning how much was actually stored.
    pub fn fill(&mut self, offered: f64) -> f64 {
        let stored = offered.max(0.0).min(self.room());
        self.amount = (self.amount + stored).min(self.capacity);
        stored
    }

    /// Apply a signed change, clamped to the tank. Returns the applied change.
    pub fn apply(&mut self, delta: f64) -> f64 {
        if delta >= 0.0 { self.fill(delta) } else { -self.draw(-delta) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(FuelTransfer::new(TransferDirection::In, 0.0).is_none());
        assert!(FuelTransfer::new(TransferDirection::In, -1.0).is_none());
        assert!(FuelTransfer::new(TransferDirection::Out, f64::NAN).is_none());
        assert!(FuelTransfer::new(TransferDirection::Out, 2.5).is_some());
    }

    #[test]
    fn test_transfer_amount_bounded() {
        assert_relative_eq!(transfer_amount(10.0, 0.5, 100.0, 100.0), 5.0);
        assert_relative_eq!(transfer_amount(10.0, 0.5, 2.0, 100.0), 2.0);
        assert_relative_eq!(transfer_amount(10.0, 0.5, 100.0, 1.0), 1.0);
        assert_eq!(transfer_amount(10.0, 0.5, -3.0, 100.0), 0.0);
    }

    #[test]
    fn test_tank_clamps() {
        let mut tank = FuelTank::with_amount(150.0, 100.0);
        assert_eq!(tank.amount(), 100.0);

        assert_relative_eq!(tank.draw(30.0), 30.0);
        assert_relative_eq!(tank.amount(), 70.0);

        assert_relative_eq!(tank.draw(500.0), 70.0);
        assert!(tank.is_empty());

        assert_relative_eq!(tank.fill(250.0), 100.0);
        assert!(tank.is_full());
    }

    #[test]
    fn test_tank_apply_signed() {
        let mut tank = FuelTank::with_amount(50.0, 100.0);
        assert_relative_eq!(tank.apply(-20.0), -20.0);
        assert_relative_eq!(tank.apply(80.0), 70.0);
        assert_relative_eq!(tank.amount(), 100.0);
    }

    #[test]
    fn test_fraction_zero_capacity() {
        let tank = FuelTank::full(0.0);
        assert_eq!(tank.fraction(), 0.0);
    }
}
