// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The location source seam.

use core::fmt;

use waymark_geo::GeoPoint;

use crate::error::LocationError;
use crate::options::WatchOptions;
use crate::permission::PermissionState;

/// Receives every sample (or per-sample failure) of a subscription.
pub type SampleSink = Box<dyn FnMut(Result<GeoPoint, LocationError>) + Send>;

/// A provider of position samples: a device's location service, a recorded trace, a
/// simulated feed.
///
/// Implementations deliver samples to the sink in the order they want them processed and
/// never call the same sink concurrently.
pub trait LocationSource {
    /// Start delivering samples to `sink` until the returned [`Subscription`] is cancelled.
    ///
    /// Return [`LocationError::Unsupported`] if the platform has no location capability.
    /// Per-sample failures go to the sink instead.
    fn subscribe(
        &self,
        sink: SampleSink,
        options: &WatchOptions,
    ) -> Result<Subscription, LocationError>;

    /// Fetch a single position.
    fn current_position(&self, options: &WatchOptions) -> Result<GeoPoint, LocationError>;

    /// Report the permission state, if the platform can answer without fetching a position.
    fn permission(&self) -> Option<PermissionState> {
        None
    }
}

impl<S: LocationSource + ?Sized> LocationSource for &S {
    fn subscribe(
        &self,
        sink: SampleSink,
        options: &WatchOptions,
    ) -> Result<Subscription, LocationError> {
        (**self).subscribe(sink, options)
    }

    fn current_position(&self, options: &WatchOptions) -> Result<GeoPoint, LocationError> {
        (**self).current_position(options)
    }

    fn permission(&self) -> Option<PermissionState> {
        (**self).permission()
    }
}

/// Cancellation handle for one [`LocationSource::subscribe`] call.
///
/// Cancelling is idempotent. Dropping a subscription cancels it.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the action that detaches the sink from its source.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the sink. Later calls do nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Returns `true` once [`Subscription::cancel`] has run.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
