// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outbound notifications of a watch session.

use core::fmt;

use waymark_geo::{GeoPoint, Geofence};

use crate::error::LocationError;

/// Receives the notifications of a watch session.
///
/// All methods are called synchronously while a sample is being processed, in this
/// order: [`on_location_update`](Self::on_location_update), then one
/// [`on_geofence_enter`](Self::on_geofence_enter) per entered fence, then one
/// [`on_geofence_exit`](Self::on_geofence_exit) per exited fence. Failed samples produce a
/// single [`on_error`](Self::on_error) and leave containment untouched.
///
/// Every method defaults to doing nothing.
pub trait GeofenceListener {
    /// A new sample arrived.
    fn on_location_update(&mut self, location: &GeoPoint) {
        let _ = location;
    }

    /// `location` is the first sample inside `fence`.
    fn on_geofence_enter(&mut self, fence: &Geofence, location: &GeoPoint) {
        let _ = (fence, location);
    }

    /// `location` is the first sample outside `fence` after being inside.
    fn on_geofence_exit(&mut self, fence: &Geofence, location: &GeoPoint) {
        let _ = (fence, location);
    }

    /// The source failed to produce a sample.
    fn on_error(&mut self, error: &LocationError) {
        let _ = error;
    }
}

type PointFn = Box<dyn FnMut(&GeoPoint) + Send>;
type FenceFn = Box<dyn FnMut(&Geofence, &GeoPoint) + Send>;
type ErrorFn = Box<dyn FnMut(&LocationError) + Send>;

/// A [`GeofenceListener`] assembled from closures.
///
/// ```
/// use waymark_watch::Callbacks;
///
/// let listener = Callbacks::new()
///     .on_enter(|fence, _| println!("welcome to {}", fence.id()))
///     .on_exit(|fence, _| println!("left {}", fence.id()));
/// # let _ = listener;
/// ```
#[derive(Default)]
pub struct Callbacks {
    location: Option<PointFn>,
    enter: Option<FenceFn>,
    exit: Option<FenceFn>,
    error: Option<ErrorFn>,
}

impl Callbacks {
    /// A listener that ignores everything until handlers are attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle every sample.
    #[must_use]
    pub fn on_location_update(mut self, f: impl FnMut(&GeoPoint) + Send + 'static) -> Self {
        self.location = Some(Box::new(f));
        self
    }

    /// Handle fence entries.
    #[must_use]
    pub fn on_enter(mut self, f: impl FnMut(&Geofence, &GeoPoint) + Send + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Handle fence exits.
    #[must_use]
    pub fn on_exit(mut self, f: impl FnMut(&Geofence, &GeoPoint) + Send + 'static) -> Self {
        self.exit = Some(Box::new(f));
        self
    }

    /// Handle source failures.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&LocationError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl GeofenceListener for Callbacks {
    fn on_location_update(&mut self, location: &GeoPoint) {
        if let Some(f) = &mut self.location {
            f(location);
        }
    }

    fn on_geofence_enter(&mut self, fence: &Geofence, location: &GeoPoint) {
        if let Some(f) = &mut self.enter {
            f(fence, location);
        }
    }

    fn on_geofence_exit(&mut self, fence: &Geofence, location: &GeoPoint) {
        if let Some(f) = &mut self.exit {
            f(fence, location);
        }
    }

    fn on_error(&mut self, error: &LocationError) {
        if let Some(f) = &mut self.error {
            f(error);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("location", &self.location.is_some())
            .field("enter", &self.enter.is_some())
            .field("exit", &self.exit.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}
