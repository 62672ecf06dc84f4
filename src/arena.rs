//! Handle-based storage for session-owned objects.
//!
//! Handles are never reused: once an id is removed, every later lookup with
//! it returns `None`. That is what lets registries hold plain ids instead of
//! references and still detect stale entries.

use std::collections::BTreeMap;
use std::fmt;

/// Types usable as arena handles.
pub trait IdLike: Copy + Ord + fmt::Debug {
    fn from_raw(index: u32) -> Self;
    fn into_raw(self) -> u32;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl IdLike for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn into_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a planet or moon owned by a [`crate::session::GameSession`].
    PlanetId
);
define_id!(
    /// Handle to a vehicle manager owned by a [`crate::session::GameSession`].
    VehicleManagerId
);
define_id!(
    /// Handle to a satellite network owned by a [`crate::session::GameSession`].
    SatelliteManagerId
);
define_id!(
    /// Handle to a satellite inside one [`crate::satellite::SatelliteManager`].
    SatelliteId
);

/// Ordered map from monotonically assigned ids to values.
///
/// Iteration follows insertion order because ids only grow, which gives
/// "first registered wins" semantics to any linear scan over the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena<Id: IdLike, T> {
    inner: BTreeMap<Id, T>,
    next_id: u32,
}

impl<Id: IdLike, T> Arena<Id, T> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn push(&mut self, value: T) -> Id {
        let id = Id::from_raw(self.next_id);
        self.next_id += 1;
        self.inner.insert(id, value);
        id
    }

    /// Insert under a known id, e.g. when restoring a saved session.
    ///
    /// Later pushes continue above it, so the id stays unique.
    pub fn insert(&mut self, id: Id, value: T) -> Option<T> {
        self.next_id = self.next_id.max(id.into_raw().saturating_add(1));
        self.inner.insert(id, value)
    }

    /// Raw value the next push will use.
    pub fn next_raw(&self) -> u32 {
        self.next_id
    }

    /// Never hand out ids below `next`. Lowering is ignored.
    pub fn reserve_through(&mut self, next: u32) {
        self.next_id = self.next_id.max(next);
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.inner.get(&id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.inner.get_mut(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn remove(&mut self, id: Id) -> Option<T> {
        self.inner.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> {
        self.inner.iter().map(|(id, v)| (*id, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id, &mut T)> {
        self.inner.iter_mut().map(|(id, v)| (*id, v))
    }

    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.inner.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.inner.values_mut()
    }
}

impl<Id: IdLike, T> Default for Arena<Id, T> {
    fn default() -> Self {
        Self::new()
    }
}
