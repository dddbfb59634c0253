// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The enter/exit state machine.

use alloc::string::String;

use hashbrown::HashSet;
use smallvec::SmallVec;
use waymark_geo::{GeoPoint, is_within};

use crate::registry::Registry;
use crate::transition::{TransitionKind, Transitions};

/// Ids of the fences that contained the last processed sample.
///
/// Every fence starts out `Outside`; an id is present here exactly when its fence is
/// `Inside`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionState {
    containing: HashSet<String>,
}

impl TransitionState {
    /// Returns `true` if the fence with `id` is currently `Inside`.
    pub fn contains(&self, id: &str) -> bool {
        self.containing.contains(id)
    }

    /// Ids currently `Inside`, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.containing.iter().map(String::as_str)
    }

    /// Number of fences currently `Inside`.
    pub fn len(&self) -> usize {
        self.containing.len()
    }

    /// Returns `true` if no fence is `Inside`.
    pub fn is_empty(&self) -> bool {
        self.containing.is_empty()
    }
}

/// Turns a sequence of location samples into enter/exit transitions.
///
/// The tracker owns one [`Registry`] and one [`TransitionState`]. Each call to
/// [`Tracker::process_sample`] re-tests every fence (a linear scan in registry order),
/// diffs the result against the stored state, and returns the crossings.
///
/// The tracker is a plain `&mut self` state machine with no interior synchronization. If
/// samples arrive from several threads, serialize the calls (for example behind a mutex).
/// Give every independent session its own tracker.
///
/// ```
/// use waymark_geo::{GeoPoint, Geofence};
/// use waymark_tracker::{Registry, Tracker, TransitionKind};
///
/// let fence = Geofence::new("hq", GeoPoint::new(40.0, -74.0), 500.0, "campaign-1").unwrap();
/// let mut tracker = Tracker::new(Registry::from_fences([fence]).unwrap());
///
/// let entered = tracker.process_sample(GeoPoint::new(40.0, -74.0));
/// assert_eq!(entered.iter().next().unwrap().kind, TransitionKind::Enter);
///
/// // Staying put is quiet.
/// assert!(tracker.process_sample(GeoPoint::new(40.0, -74.0)).is_empty());
///
/// let left = tracker.process_sample(GeoPoint::new(40.005, -74.0));
/// assert_eq!(left.iter().next().unwrap().kind, TransitionKind::Exit);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Tracker {
    registry: Registry,
    state: TransitionState,
    last_location: Option<GeoPoint>,
}

impl Tracker {
    /// Create a tracker over `registry` with every fence `Outside`.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            state: TransitionState::default(),
            last_location: None,
        }
    }

    /// Evaluate one sample and return the resulting transitions.
    ///
    /// The first sample of a session may enter any number of fences at once. Repeating a
    /// sample yields no transitions. Samples are taken as delivered; timestamps are not
    /// used for ordering or deduplication.
    pub fn process_sample(&mut self, location: GeoPoint) -> Transitions {
        let transitions = self.evaluate(location);
        self.last_location = Some(location);
        transitions
    }

    /// Swap in a new registry and re-evaluate it against the last known location.
    ///
    /// Fences that are new and contain the last location fire `Enter`. Fences kept under
    /// the same id fire only if their containment changed. Fences that were removed while
    /// `Inside` are dropped without an `Exit`, since their definition is gone. Without a
    /// last location the state is simply cleared.
    pub fn replace_registry(&mut self, registry: Registry) -> Transitions {
        self.registry = registry;
        match self.last_location {
            Some(location) => self.evaluate(location),
            None => {
                self.state = TransitionState::default();
                Transitions::default()
            }
        }
    }

    /// Forget all containment and the last location, as at the start of a new session.
    ///
    /// No `Exit` transitions are synthesized.
    pub fn reset(&mut self) {
        self.state = TransitionState::default();
        self.last_location = None;
    }

    /// Returns `true` if the fence with `id` contained the last sample.
    pub fn is_inside(&self, id: &str) -> bool {
        self.state.contains(id)
    }

    /// The current containment state.
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    /// The last processed sample, if any.
    pub fn last_location(&self) -> Option<&GeoPoint> {
        self.last_location.as_ref()
    }

    /// The fences being tracked.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn evaluate(&mut self, location: GeoPoint) -> Transitions {
        let inside: SmallVec<[bool; 16]> = self
            .registry
            .iter()
            .map(|fence| is_within(&location, fence))
            .collect();

        let mut transitions = Transitions::default();
        for (fence, &now) in self.registry.iter().zip(&inside) {
            if now && !self.state.contains(fence.id()) {
                transitions.push(TransitionKind::Enter, fence, location);
            }
        }
        for (fence, &now) in self.registry.iter().zip(&inside) {
            if !now && self.state.contains(fence.id()) {
                transitions.push(TransitionKind::Exit, fence, location);
            }
        }

        // Ids left over from a replaced registry fall out here as well.
        let stale = self.state.len() != inside.iter().filter(|&&now| now).count();
        if !transitions.is_empty() || stale {
            self.state.containing = self
                .registry
                .iter()
                .zip(&inside)
                .filter(|&(_, &now)| now)
                .map(|(fence, _)| fence.id().into())
                .collect();
        }
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use waymark_geo::Geofence;

    fn fence(id: &str, lat: f64, lng: f64, radius: f64) -> Geofence {
        Geofence::new(id, GeoPoint::new(lat, lng), radius, "campaign").unwrap()
    }

    fn summary(t: &Transitions) -> Vec<(TransitionKind, &str)> {
        t.iter().map(|t| (t.kind, t.geofence.id())).collect()
    }

    #[test]
    fn starts_outside_and_first_sample_enters() {
        let mut tracker = Tracker::new(
            Registry::from_fences(vec![
                fence("a", 0.0, 0.0, 1_000.0),
                fence("b", 0.0, 0.0, 2_000.0),
            ])
            .unwrap(),
        );
        assert!(tracker.state().is_empty());
        assert!(tracker.last_location().is_none());

        let t = tracker.process_sample(GeoPoint::new(0.0, 0.0));
        assert_eq!(
            summary(&t),
            [(TransitionKind::Enter, "a"), (TransitionKind::Enter, "b")]
        );
        assert!(tracker.is_inside("a") && tracker.is_inside("b"));
    }

    #[test]
    fn overlapping_fences_exit_independently() {
        // F1 only contains S1; F2 contains both S1 and S2.
        let s1 = GeoPoint::new(0.0, 0.0);
        let s2 = s1.destination(90.0, 800.0);
        let mut tracker = Tracker::new(
            Registry::from_fences(vec![
                fence("f1", 0.0, 0.0, 500.0),
                fence("f2", 0.0, 0.0, 1_000.0),
            ])
            .unwrap(),
        );

        let first = tracker.process_sample(s1);
        assert_eq!(
            summary(&first),
            [(TransitionKind::Enter, "f1"), (TransitionKind::Enter, "f2")]
        );

        let second = tracker.process_sample(s2);
        assert_eq!(summary(&second), [(TransitionKind::Exit, "f1")]);
        assert!(tracker.is_inside("f2"));
        assert!(!tracker.is_inside("f1"));
    }

    #[test]
    fn repeated_sample_is_quiet() {
        let p = GeoPoint::new(0.0, 0.0);
        let mut tracker =
            Tracker::new(Registry::from_fences(vec![fence("a", 0.0, 0.0, 10.0)]).unwrap());
        assert_eq!(tracker.process_sample(p).len(), 1);
        assert!(tracker.process_sample(p).is_empty());
        assert!(tracker.process_sample(p.with_timestamp(1)).is_empty());
    }

    #[test]
    fn enter_exit_enter_around_a_500m_fence() {
        let mut tracker = Tracker::new(
            Registry::from_fences(vec![fence("store", 40.0, -74.0, 500.0)]).unwrap(),
        );

        let a = tracker.process_sample(GeoPoint::new(40.0, -74.0));
        assert_eq!(summary(&a), [(TransitionKind::Enter, "store")]);

        let b = tracker.process_sample(GeoPoint::new(40.005, -74.0));
        assert_eq!(summary(&b), [(TransitionKind::Exit, "store")]);
        assert_eq!(b.iter().next().unwrap().location, GeoPoint::new(40.005, -74.0));

        let c = tracker.process_sample(GeoPoint::new(40.004, -74.0));
        assert_eq!(summary(&c), [(TransitionKind::Enter, "store")]);
    }

    #[test]
    fn enters_precede_exits_within_a_sample() {
        let west = GeoPoint::new(0.0, -0.01);
        let east = GeoPoint::new(0.0, 0.01);
        let mut tracker = Tracker::new(
            Registry::from_fences(vec![
                fence("w", 0.0, -0.01, 100.0),
                fence("e", 0.0, 0.01, 100.0),
            ])
            .unwrap(),
        );
        tracker.process_sample(west);
        let t = tracker.process_sample(east);
        assert_eq!(
            summary(&t),
            [(TransitionKind::Enter, "e"), (TransitionKind::Exit, "w")]
        );
        assert_eq!(t.enters().count(), 1);
        assert_eq!(t.exits().count(), 1);
    }

    #[test]
    fn simultaneous_enters_follow_registry_order() {
        let mut tracker = Tracker::new(
            Registry::from_fences(vec![
                fence("z", 0.0, 0.0, 50.0),
                fence("m", 0.0, 0.0, 50.0),
                fence("a", 0.0, 0.0, 50.0),
            ])
            .unwrap(),
        );
        let t = tracker.process_sample(GeoPoint::new(0.0, 0.0));
        let ids: Vec<_> = t.iter().map(|t| t.geofence.id()).collect();
        assert_eq!(ids, ["z", "m", "a"]);
    }

    #[test]
    fn reset_forgets_without_exits() {
        let p = GeoPoint::new(0.0, 0.0);
        let mut tracker =
            Tracker::new(Registry::from_fences(vec![fence("a", 0.0, 0.0, 10.0)]).unwrap());
        tracker.process_sample(p);
        tracker.reset();
        assert!(!tracker.is_inside("a"));
        assert!(tracker.last_location().is_none());
        // A fresh session re-enters.
        assert_eq!(tracker.process_sample(p).len(), 1);
    }

    #[test]
    fn replace_registry_reevaluates_last_location() {
        let p = GeoPoint::new(0.0, 0.0);
        let mut tracker = Tracker::new(
            Registry::from_fences(vec![
                fence("kept", 0.0, 0.0, 10.0),
                fence("gone", 0.0, 0.0, 10.0),
            ])
            .unwrap(),
        );
        tracker.process_sample(p);

        let t = tracker.replace_registry(
            Registry::from_fences(vec![
                fence("kept", 0.0, 0.0, 10.0),
                fence("new", 0.0, 0.0, 10.0),
            ])
            .unwrap(),
        );
        assert_eq!(summary(&t), [(TransitionKind::Enter, "new")]);
        assert!(tracker.is_inside("kept"));
        assert!(tracker.is_inside("new"));
        assert!(!tracker.is_inside("gone"), "removed fences leave the state silently");
        assert_eq!(tracker.state().len(), 2);
    }

    #[test]
    fn replace_registry_with_redefined_fence_exits() {
        let p = GeoPoint::new(0.0, 0.0);
        let mut tracker =
            Tracker::new(Registry::from_fences(vec![fence("a", 0.0, 0.0, 10.0)]).unwrap());
        tracker.process_sample(p);

        // Same id, moved far away.
        let t = tracker.replace_registry(
            Registry::from_fences(vec![fence("a", 10.0, 10.0, 10.0)]).unwrap(),
        );
        assert_eq!(summary(&t), [(TransitionKind::Exit, "a")]);
    }

    #[test]
    fn replace_registry_before_any_sample_is_quiet() {
        let mut tracker = Tracker::default();
        let t = tracker.replace_registry(
            Registry::from_fences(vec![fence("a", 0.0, 0.0, 10.0)]).unwrap(),
        );
        assert!(t.is_empty());
        assert_eq!(tracker.registry().len(), 1);
    }

    #[test]
    fn empty_registry_never_transitions() {
        let mut tracker = Tracker::default();
        assert!(tracker.process_sample(GeoPoint::new(1.0, 1.0)).is_empty());
        assert_eq!(tracker.last_location(), Some(&GeoPoint::new(1.0, 1.0)));
    }
}
