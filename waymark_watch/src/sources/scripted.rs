// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A location source driven by hand.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use waymark_geo::GeoPoint;

use crate::error::LocationError;
use crate::options::WatchOptions;
use crate::permission::PermissionState;
use crate::source::{LocationSource, SampleSink, Subscription};

type SharedSink = Arc<Mutex<SampleSink>>;

#[derive(Default)]
struct Inner {
    subscribers: Vec<(u64, SharedSink)>,
    next_id: u64,
    current: Option<Result<GeoPoint, LocationError>>,
    permission: Option<PermissionState>,
    unsupported: bool,
    last_options: Option<WatchOptions>,
}

/// A source driven by explicit [`push`](Self::push) and [`fail`](Self::fail) calls.
///
/// Deliveries run synchronously on the calling thread, in subscription order. Cloning
/// yields another handle to the same feed.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedSource {
    /// An empty feed with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that behaves like a platform without location support.
    pub fn unsupported() -> Self {
        let source = Self::new();
        source.lock().unsupported = true;
        source
    }

    /// Set the answer to [`LocationSource::current_position`].
    ///
    /// Without one, single fetches fail with [`LocationError::PositionUnavailable`].
    #[must_use]
    pub fn with_current_position(self, result: Result<GeoPoint, LocationError>) -> Self {
        self.lock().current = Some(result);
        self
    }

    /// Set the answer to [`LocationSource::permission`].
    #[must_use]
    pub fn with_permission(self, state: PermissionState) -> Self {
        self.lock().permission = Some(state);
        self
    }

    /// Deliver a sample to every live subscriber.
    pub fn push(&self, location: GeoPoint) {
        self.deliver(Ok(location));
    }

    /// Deliver a failure to every live subscriber.
    pub fn fail(&self, error: LocationError) {
        self.deliver(Err(error));
    }

    /// Deliver `sample` to every live subscriber.
    pub fn deliver(&self, sample: Result<GeoPoint, LocationError>) {
        let subscribers: Vec<(u64, SharedSink)> = self.lock().subscribers.clone();
        for (id, sink) in subscribers {
            // A sink may cancel itself or another subscription mid-delivery.
            if !self.is_subscribed(id) {
                continue;
            }
            let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
            let sink = &mut *guard;
            sink(sample);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Options passed to the most recent [`LocationSource::subscribe`] call.
    pub fn last_options(&self) -> Option<WatchOptions> {
        self.lock().last_options
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.lock().subscribers.iter().any(|(sub, _)| *sub == id)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationSource for ScriptedSource {
    fn subscribe(
        &self,
        sink: SampleSink,
        options: &WatchOptions,
    ) -> Result<Subscription, LocationError> {
        let mut inner = self.lock();
        if inner.unsupported {
            return Err(LocationError::Unsupported);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(Mutex::new(sink))));
        inner.last_options = Some(*options);
        drop(inner);

        let feed = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(feed) = feed.upgrade() {
                feed.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .subscribers
                    .retain(|(sub, _)| *sub != id);
            }
        }))
    }

    fn current_position(&self, _options: &WatchOptions) -> Result<GeoPoint, LocationError> {
        let inner = self.lock();
        if inner.unsupported {
            return Err(LocationError::Unsupported);
        }
        inner
            .current
            .unwrap_or(Err(LocationError::PositionUnavailable))
    }

    fn permission(&self) -> Option<PermissionState> {
        self.lock().permission
    }
}

impl fmt::Debug for ScriptedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ScriptedSource")
            .field("subscribers", &inner.subscribers.len())
            .field("current", &inner.current)
            .field("permission", &inner.permission)
            .field("unsupported", &inner.unsupported)
            .finish_non_exhaustive()
    }
}
