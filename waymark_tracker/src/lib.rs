// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Waymark Tracker: geofence enter/exit detection.
//!
//! ## Overview
//!
//! This crate turns a stream of [`GeoPoint`](waymark_geo::GeoPoint) samples into
//! boundary crossings against a fixed [`Registry`] of circular fences.
//! It does not obtain locations itself and it does not call back into user code; feed it
//! samples and act on the [`Transitions`] it returns. `waymark_watch` layers callbacks and
//! platform location feeds on top.
//!
//! ## State machine
//!
//! Each fence is either `Outside` or `Inside`. All fences start `Outside`, so the first
//! sample of a session can enter any number of them at once. On every sample the tracker:
//!
//! 1. tests every fence in registry order,
//! 2. reports an `Enter` for each fence that now contains the sample but did not before,
//! 3. reports an `Exit` for each fence that contained the previous sample but not this one,
//! 4. replaces its [`TransitionState`] with the fresh result.
//!
//! Staying inside or outside is silent. There is no terminal state and resetting or
//! dropping a tracker never synthesizes exits.
//!
//! ## Ordering
//!
//! Within one sample all enters are reported before any exit, each group in registry order.
//!
//! ## Changing fences
//!
//! [`Tracker::replace_registry`] swaps the fence set mid-session and immediately
//! re-evaluates it against the last known location, so newly added fences that already
//! contain the user fire `Enter` without waiting for the next sample.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod registry;
mod tracker;
mod transition;

pub use registry::{Registry, RegistryError};
pub use tracker::{Tracker, TransitionState};
pub use transition::{Transition, TransitionKind, Transitions};
