// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered, id-addressable collection of geofences.

use alloc::string::String;
use alloc::vec::Vec;
use core::slice;

use hashbrown::HashMap;
use waymark_geo::{FenceRecord, GeoPoint, Geofence, GeofenceError};

/// Errors raised while assembling a [`Registry`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Two fences share an id.
    #[error("duplicate geofence id {0:?}")]
    DuplicateId(String),
    /// A record could not be turned into a fence.
    #[error(transparent)]
    Invalid(#[from] GeofenceError),
}

/// The set of geofences evaluated by a tracker.
///
/// Iteration follows insertion order, which is also the order in which simultaneous
/// transitions are reported. Ids are unique. Lookups by id are constant time; containment
/// queries are a linear scan.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    fences: Vec<Geofence>,
    slots: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from fences in the given order.
    pub fn from_fences(fences: impl IntoIterator<Item = Geofence>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for fence in fences {
            registry.insert(fence)?;
        }
        Ok(registry)
    }

    /// Build a registry from `(id, record)` pairs that all belong to `owner_id`.
    ///
    /// Each record is validated as in [`Geofence::from_record`].
    pub fn from_records<I, S>(owner_id: &str, records: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, FenceRecord)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (id, record) in records {
            registry.insert(Geofence::from_record(id, owner_id, record)?)?;
        }
        Ok(registry)
    }

    /// Append a fence. Fails if its id is already present.
    pub fn insert(&mut self, fence: Geofence) -> Result<(), RegistryError> {
        if self.slots.contains_key(fence.id()) {
            return Err(RegistryError::DuplicateId(fence.id().into()));
        }
        self.slots.insert(fence.id().into(), self.fences.len());
        self.fences.push(fence);
        Ok(())
    }

    /// Look up a fence by id.
    pub fn get(&self, id: &str) -> Option<&Geofence> {
        self.slots.get(id).map(|&slot| &self.fences[slot])
    }

    /// Returns `true` if a fence with `id` is present.
    pub fn contains_id(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Fences in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, Geofence> {
        self.fences.iter()
    }

    /// Fences owned by `owner_id`, in insertion order.
    pub fn by_owner<'a>(&'a self, owner_id: &'a str) -> impl Iterator<Item = &'a Geofence> + 'a {
        self.fences.iter().filter(move |f| f.owner_id() == owner_id)
    }

    /// Fences whose circle contains `point`, in insertion order.
    pub fn containing<'a>(
        &'a self,
        point: &'a GeoPoint,
    ) -> impl Iterator<Item = &'a Geofence> + 'a {
        self.fences.iter().filter(move |f| f.contains(point))
    }

    /// Number of fences.
    pub fn len(&self) -> usize {
        self.fences.len()
    }

    /// Returns `true` if there are no fences.
    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Geofence;
    type IntoIter = slice::Iter<'a, Geofence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn fence(id: &str, owner: &str, lat: f64) -> Geofence {
        Geofence::new(id, GeoPoint::new(lat, 0.0), 100.0, owner).unwrap()
    }

    #[test]
    fn preserves_insertion_order() {
        let reg = Registry::from_fences(vec![
            fence("c", "o", 0.0),
            fence("a", "o", 1.0),
            fence("b", "o", 2.0),
        ])
        .unwrap();
        let ids: Vec<_> = reg.iter().map(Geofence::id).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(reg.get("a").unwrap().center().latitude, 1.0);
        assert!(reg.get("z").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Registry::from_fences(vec![fence("a", "o", 0.0), fence("a", "o", 1.0)]);
        assert_eq!(err.unwrap_err(), RegistryError::DuplicateId("a".into()));
    }

    #[test]
    fn from_records_validates() {
        let ok = Registry::from_records(
            "campaign-1",
            vec![
                ("north", FenceRecord { lat: 1.0, lng: 0.0, radius: 50.0 }),
                ("south", FenceRecord { lat: -1.0, lng: 0.0, radius: 50.0 }),
            ],
        )
        .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.by_owner("campaign-1").count(), 2);

        let bad = Registry::from_records(
            "campaign-1",
            vec![("bad", FenceRecord { lat: 0.0, lng: 0.0, radius: 0.0 })],
        );
        assert!(matches!(bad, Err(RegistryError::Invalid(_))));
    }

    #[test]
    fn owner_and_containment_filters() {
        let reg = Registry::from_fences(vec![
            fence("a", "red", 0.0),
            fence("b", "blue", 0.0),
            fence("c", "red", 5.0),
        ])
        .unwrap();
        let red: Vec<_> = reg.by_owner("red").map(Geofence::id).collect();
        assert_eq!(red, ["a", "c"]);

        let origin = GeoPoint::new(0.0, 0.0);
        let hits: Vec<_> = reg.containing(&origin).map(Geofence::id).collect();
        assert_eq!(hits, ["a", "b"]);
    }
}
