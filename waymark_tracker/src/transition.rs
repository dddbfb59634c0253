// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Enter/exit events produced by the tracker.

use core::slice;

use smallvec::SmallVec;
use waymark_geo::{GeoPoint, Geofence};

/// Direction of a boundary crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// The location moved from outside to inside (or onto the boundary of) a fence.
    Enter,
    /// The location moved from inside to outside a fence.
    Exit,
}

/// One boundary crossing: which fence, which way, and the sample that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Enter or exit.
    pub kind: TransitionKind,
    /// The fence that was crossed.
    pub geofence: Geofence,
    /// The sample that triggered the crossing.
    pub location: GeoPoint,
}

impl Transition {
    /// Returns `true` for [`TransitionKind::Enter`].
    pub fn is_enter(&self) -> bool {
        self.kind == TransitionKind::Enter
    }

    /// Returns `true` for [`TransitionKind::Exit`].
    pub fn is_exit(&self) -> bool {
        self.kind == TransitionKind::Exit
    }
}

/// All transitions caused by a single sample.
///
/// Enters come first, in registry order, followed by exits, in registry order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transitions {
    items: SmallVec<[Transition; 4]>,
}

impl Transitions {
    pub(crate) fn push(&mut self, kind: TransitionKind, geofence: &Geofence, location: GeoPoint) {
        self.items.push(Transition {
            kind,
            geofence: geofence.clone(),
            location,
        });
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the sample crossed no boundary.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All transitions, enters before exits.
    pub fn iter(&self) -> slice::Iter<'_, Transition> {
        self.items.iter()
    }

    /// Enter transitions only.
    pub fn enters(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.items.iter().filter(|t| t.is_enter())
    }

    /// Exit transitions only.
    pub fn exits(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.items.iter().filter(|t| t.is_exit())
    }
}

impl IntoIterator for Transitions {
    type Item = Transition;
    type IntoIter = smallvec::IntoIter<[Transition; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Transitions {
    type Item = &'a Transition;
    type IntoIter = slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
