// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch sessions: a tracker wired between a location source and a listener.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};
use waymark_geo::GeoPoint;
use waymark_tracker::{Registry, Tracker, TransitionKind};

use crate::error::LocationError;
use crate::listener::GeofenceListener;
use crate::options::WatchOptions;
use crate::source::{LocationSource, Subscription};

/// Drives one [`Tracker`] and forwards its output to a [`GeofenceListener`].
///
/// This is the synchronous core of a watch session and can be fed by hand, which is
/// convenient for tests and for hosts that already own an event loop. [`watch`] wraps it
/// in a source subscription.
#[derive(Debug)]
pub struct Watcher<L> {
    tracker: Tracker,
    listener: L,
    active: Arc<AtomicBool>,
}

impl<L: GeofenceListener> Watcher<L> {
    /// Start an active session over `registry` with every fence outside.
    pub fn new(registry: Registry, listener: L) -> Self {
        Self {
            tracker: Tracker::new(registry),
            listener,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Process one delivery from the source.
    ///
    /// A sample is forwarded to the listener before any fence is evaluated, then enters and
    /// exits are reported. A failure is reported through
    /// [`GeofenceListener::on_error`] and leaves containment untouched; terminal failures
    /// also end the session. Once stopped, deliveries are ignored, and stopping from inside
    /// a callback suppresses the rest of that sample's callbacks.
    pub fn handle(&mut self, sample: Result<GeoPoint, LocationError>) {
        if !self.is_active() {
            return;
        }
        match sample {
            Ok(location) => self.handle_location(location),
            Err(error) => {
                debug!(%error, "location sample failed");
                if error.is_terminal() {
                    self.active.store(false, Ordering::SeqCst);
                }
                self.listener.on_error(&error);
            }
        }
    }

    fn handle_location(&mut self, location: GeoPoint) {
        self.listener.on_location_update(&location);
        let transitions = self.tracker.process_sample(location);
        if transitions.is_empty() {
            return;
        }
        trace!(
            latitude = location.latitude,
            longitude = location.longitude,
            count = transitions.len(),
            "geofence transitions"
        );
        for transition in &transitions {
            if !self.is_active() {
                break;
            }
            match transition.kind {
                TransitionKind::Enter => self
                    .listener
                    .on_geofence_enter(&transition.geofence, &transition.location),
                TransitionKind::Exit => self
                    .listener
                    .on_geofence_exit(&transition.geofence, &transition.location),
            }
        }
    }

    /// Returns `true` until the session is stopped or its feed ends.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop reacting to deliveries. Idempotent.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// The underlying tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// The listener, mutably.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Consume the watcher and return its listener.
    pub fn into_listener(self) -> L {
        self.listener
    }
}

/// Start a watch session: subscribe `listener` to `source` through a fresh tracker.
///
/// Fails synchronously with [`LocationError::Unsupported`] when the source has no location
/// capability. The session ends when [`WatchHandle::stop`] is called, when the handle is
/// dropped, or when the source reports a terminal error. In every case the subscription
/// is cancelled as soon as the session ends.
///
/// ```
/// use std::sync::mpsc;
/// use waymark_geo::{GeoPoint, Geofence};
/// use waymark_tracker::Registry;
/// use waymark_watch::{Callbacks, ScriptedSource, WatchOptions, watch};
///
/// let fence = Geofence::new("plaza", GeoPoint::new(40.0, -74.0), 500.0, "campaign-3").unwrap();
/// let (tx, rx) = mpsc::channel();
/// let source = ScriptedSource::new();
/// let handle = watch(
///     &source,
///     Registry::from_fences([fence]).unwrap(),
///     Callbacks::new().on_enter(move |fence, _| tx.send(fence.id().to_owned()).unwrap()),
///     &WatchOptions::default(),
/// )
/// .unwrap();
///
/// source.push(GeoPoint::new(40.0, -74.0));
/// assert_eq!(rx.try_recv().unwrap(), "plaza");
///
/// handle.stop();
/// handle.stop();
/// ```
pub fn watch<S, L>(
    source: &S,
    registry: Registry,
    listener: L,
    options: &WatchOptions,
) -> Result<WatchHandle, LocationError>
where
    S: LocationSource + ?Sized,
    L: GeofenceListener + Send + 'static,
{
    let fences = registry.len();
    let mut watcher = Watcher::new(registry, listener);
    let active = Arc::clone(&watcher.active);
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
    let own_slot = Arc::clone(&slot);
    let sink = move |sample: Result<GeoPoint, LocationError>| {
        watcher.handle(sample);
        if !watcher.is_active() {
            detach(&own_slot);
        }
    };
    let subscription = source
        .subscribe(Box::new(sink), options)
        .inspect_err(|error| debug!(%error, "could not start watch session"))?;

    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);
    // A terminal error may have arrived before the subscription was stored.
    if !active.load(Ordering::SeqCst) {
        detach(&slot);
    }
    debug!(fences, "watch session started");
    Ok(WatchHandle {
        active,
        subscription: slot,
    })
}

/// Cancel the stored subscription, if any. The lock is released before cancelling.
fn detach(slot: &Mutex<Option<Subscription>>) {
    let subscription = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(mut subscription) = subscription {
        subscription.cancel();
    }
}

/// Cancellation handle of a session started with [`watch`].
///
/// Stopping is idempotent and takes effect immediately: no listener method is called for
/// samples delivered afterwards. It does not emit exits for fences still entered. Dropping
/// the handle stops the session.
#[derive(Debug)]
pub struct WatchHandle {
    active: Arc<AtomicBool>,
    subscription: Arc<Mutex<Option<Subscription>>>,
}

impl WatchHandle {
    /// End the session and detach from the source.
    pub fn stop(&self) {
        let was_active = self.active.swap(false, Ordering::SeqCst);
        detach(&self.subscription);
        if was_active {
            debug!("watch session stopped");
        }
    }

    /// Returns `true` until the session is stopped or its feed ends.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fetch a single position from `source`.
pub fn current_position<S>(source: &S, options: &WatchOptions) -> Result<GeoPoint, LocationError>
where
    S: LocationSource + ?Sized,
{
    source
        .current_position(options)
        .inspect_err(|error| debug!(%error, "single position fetch failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ScriptedSource;
    use waymark_geo::Geofence;

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Update(f64),
        Enter(String),
        Exit(String),
        Error(LocationError),
    }

    #[derive(Clone, Debug, Default)]
    struct Recorder(Arc<Mutex<Vec<Event>>>);

    impl Recorder {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl GeofenceListener for Recorder {
        fn on_location_update(&mut self, location: &GeoPoint) {
            self.0.lock().unwrap().push(Event::Update(location.latitude));
        }

        fn on_geofence_enter(&mut self, fence: &Geofence, _: &GeoPoint) {
            self.0.lock().unwrap().push(Event::Enter(fence.id().into()));
        }

        fn on_geofence_exit(&mut self, fence: &Geofence, _: &GeoPoint) {
            self.0.lock().unwrap().push(Event::Exit(fence.id().into()));
        }

        fn on_error(&mut self, error: &LocationError) {
            self.0.lock().unwrap().push(Event::Error(*error));
        }
    }

    fn store_registry() -> Registry {
        Registry::from_fences([
            Geofence::new("store", GeoPoint::new(40.0, -74.0), 500.0, "campaign").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn location_update_precedes_transitions() {
        let mut watcher = Watcher::new(store_registry(), Recorder::default());
        watcher.handle(Ok(GeoPoint::new(40.0, -74.0)));
        watcher.handle(Ok(GeoPoint::new(40.005, -74.0)));
        watcher.handle(Ok(GeoPoint::new(40.004, -74.0)));
        assert_eq!(
            watcher.listener().take(),
            [
                Event::Update(40.0),
                Event::Enter("store".into()),
                Event::Update(40.005),
                Event::Exit("store".into()),
                Event::Update(40.004),
                Event::Enter("store".into()),
            ]
        );
    }

    #[test]
    fn failed_sample_keeps_state() {
        let mut watcher = Watcher::new(store_registry(), Recorder::default());
        watcher.handle(Ok(GeoPoint::new(40.0, -74.0)));
        watcher.handle(Err(LocationError::Timeout));
        watcher.handle(Err(LocationError::PermissionDenied));
        assert!(watcher.is_active());
        assert!(watcher.tracker().is_inside("store"));

        // Still inside: no duplicate enter after the failures.
        watcher.handle(Ok(GeoPoint::new(40.0, -74.0)));
        assert_eq!(
            watcher.listener().take(),
            [
                Event::Update(40.0),
                Event::Enter("store".into()),
                Event::Error(LocationError::Timeout),
                Event::Error(LocationError::PermissionDenied),
                Event::Update(40.0),
            ]
        );
    }

    #[test]
    fn terminal_error_ends_session() {
        let mut watcher = Watcher::new(store_registry(), Recorder::default());
        watcher.handle(Err(LocationError::Disconnected));
        assert!(!watcher.is_active());
        watcher.handle(Ok(GeoPoint::new(40.0, -74.0)));
        assert_eq!(
            watcher.into_listener().take(),
            [Event::Error(LocationError::Disconnected)]
        );
    }

    #[test]
    fn terminal_error_detaches_from_the_source() {
        let recorder = Recorder::default();
        let source = ScriptedSource::new();
        let handle = watch(
            &source,
            store_registry(),
            recorder.clone(),
            &WatchOptions::default(),
        )
        .unwrap();
        source.fail(LocationError::Timeout);
        assert_eq!(source.subscriber_count(), 1, "transient errors keep the session");

        source.fail(LocationError::Disconnected);
        assert!(!handle.is_active());
        assert_eq!(source.subscriber_count(), 0);

        source.push(GeoPoint::new(40.0, -74.0));
        assert_eq!(
            recorder.take(),
            [
                Event::Error(LocationError::Timeout),
                Event::Error(LocationError::Disconnected),
            ]
        );
        handle.stop();
    }

    #[test]
    fn stopped_watcher_ignores_samples() {
        let mut watcher = Watcher::new(store_registry(), Recorder::default());
        watcher.stop();
        watcher.stop();
        watcher.handle(Ok(GeoPoint::new(40.0, -74.0)));
        assert!(watcher.listener().take().is_empty());
    }

    #[test]
    fn watch_end_to_end_through_scripted_source() {
        let recorder = Recorder::default();
        let source = ScriptedSource::new();
        let handle = watch(
            &source,
            store_registry(),
            recorder.clone(),
            &WatchOptions::default(),
        )
        .unwrap();
        assert!(handle.is_active());
        assert_eq!(source.subscriber_count(), 1);

        source.push(GeoPoint::new(40.0, -74.0));
        source.push(GeoPoint::new(40.005, -74.0));
        assert_eq!(
            recorder.take(),
            [
                Event::Update(40.0),
                Event::Enter("store".into()),
                Event::Update(40.005),
                Event::Exit("store".into()),
            ]
        );

        handle.stop();
        handle.stop();
        assert!(!handle.is_active());
        assert_eq!(source.subscriber_count(), 0);

        source.push(GeoPoint::new(40.0, -74.0));
        source.fail(LocationError::Timeout);
        assert!(recorder.take().is_empty(), "no callbacks after stop");
    }

    #[test]
    fn dropping_the_handle_stops_the_session() {
        let recorder = Recorder::default();
        let source = ScriptedSource::new();
        let handle = watch(
            &source,
            store_registry(),
            recorder.clone(),
            &WatchOptions::default(),
        )
        .unwrap();
        drop(handle);
        source.push(GeoPoint::new(40.0, -74.0));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn unsupported_source_fails_synchronously() {
        let source = ScriptedSource::unsupported();
        let err = watch(
            &source,
            store_registry(),
            Recorder::default(),
            &WatchOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, LocationError::Unsupported);
        assert_eq!(
            current_position(&source, &WatchOptions::default()),
            Err(LocationError::Unsupported)
        );
    }

    #[test]
    fn sessions_are_independent() {
        let source = ScriptedSource::new();
        let first = Recorder::default();
        let second = Recorder::default();
        let _a = watch(&source, store_registry(), first.clone(), &WatchOptions::default())
            .unwrap();
        source.push(GeoPoint::new(40.0, -74.0));

        // The second session starts with every fence outside.
        let _b = watch(&source, store_registry(), second.clone(), &WatchOptions::default())
            .unwrap();
        source.push(GeoPoint::new(40.0, -74.0));

        assert_eq!(
            first.take(),
            [
                Event::Update(40.0),
                Event::Enter("store".into()),
                Event::Update(40.0),
            ]
        );
        assert_eq!(
            second.take(),
            [Event::Update(40.0), Event::Enter("store".into())]
        );
    }

    #[test]
    fn options_reach_the_source() {
        let source = ScriptedSource::new();
        let options = WatchOptions::default().with_high_accuracy(false);
        let _handle = watch(&source, store_registry(), Recorder::default(), &options).unwrap();
        assert_eq!(source.last_options(), Some(options));
    }
}
