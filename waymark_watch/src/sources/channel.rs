// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A location source fed through a `crossbeam_channel`.

use core::fmt;
use core::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, select_biased, unbounded};
use tracing::{debug, warn};
use waymark_geo::GeoPoint;

use crate::error::LocationError;
use crate::options::WatchOptions;
use crate::source::{LocationSource, SampleSink, Subscription};

/// Items carried by a [`ChannelSource`].
pub type Sample = Result<GeoPoint, LocationError>;

type SharedSink = Arc<Mutex<SampleSink>>;

#[derive(Default)]
struct Hub {
    subscribers: Vec<(u64, SharedSink)>,
    fetches: Vec<(u64, Sender<Sample>)>,
    next_id: u64,
    reading: bool,
    closed: bool,
}

impl Hub {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_idle(&self) -> bool {
        self.subscribers.is_empty() && self.fetches.is_empty()
    }
}

struct Feed {
    rx: Receiver<Sample>,
    hub: Mutex<Hub>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Feed {
    fn lock(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the reader thread unless one is already running.
    fn ensure_reader(self: &Arc<Self>, hub: &mut Hub) -> Result<(), LocationError> {
        if hub.reading {
            return Ok(());
        }
        let feed = Arc::clone(self);
        thread::Builder::new()
            .name("waymark-location-feed".into())
            .spawn(move || feed.read_loop())
            .map_err(|err| {
                warn!(%err, "failed to spawn location feed thread");
                LocationError::Unsupported
            })?;
        hub.reading = true;
        Ok(())
    }

    /// Remove a subscriber or pending fetch and let the reader re-check for idleness.
    fn withdraw(&self, id: u64) {
        let mut hub = self.lock();
        hub.subscribers.retain(|(sub, _)| *sub != id);
        hub.fetches.retain(|(fetch, _)| *fetch != id);
        drop(hub);
        // A full wake channel already holds a pending wake.
        let _ = self.wake_tx.try_send(());
    }

    fn read_loop(&self) {
        loop {
            {
                let mut hub = self.lock();
                if hub.is_idle() {
                    hub.reading = false;
                    debug!("location feed idle");
                    return;
                }
            }
            // Wakes go first so a cancellation is seen before the next sample is taken.
            select_biased! {
                recv(self.wake_rx) -> _ => {}
                recv(self.rx) -> msg => match msg {
                    Ok(sample) => self.broadcast(sample),
                    Err(_) => {
                        debug!("location feed disconnected");
                        self.close();
                        return;
                    }
                },
            }
        }
    }

    fn broadcast(&self, sample: Sample) {
        let subscribers = {
            let mut hub = self.lock();
            for (_, fetch) in hub.fetches.drain(..) {
                let _ = fetch.try_send(sample);
            }
            hub.subscribers.clone()
        };
        for (id, sink) in subscribers {
            // A sink may cancel itself or another subscription mid-delivery.
            if !self.lock().subscribers.iter().any(|(sub, _)| *sub == id) {
                continue;
            }
            call(&sink, sample);
        }
    }

    fn close(&self) {
        let subscribers = {
            let mut hub = self.lock();
            hub.closed = true;
            hub.reading = false;
            for (_, fetch) in hub.fetches.drain(..) {
                let _ = fetch.try_send(Err(LocationError::Disconnected));
            }
            mem::take(&mut hub.subscribers)
        };
        for (_, sink) in subscribers {
            call(&sink, Err(LocationError::Disconnected));
        }
    }
}

fn call(sink: &SharedSink, sample: Sample) {
    let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
    let sink = &mut *guard;
    sink(sample);
}

/// A source fed through a `crossbeam_channel`.
///
/// One background thread reads the receiver and hands every sample to every live
/// subscription and to every pending [`LocationSource::current_position`] call, so
/// concurrent sessions each see the whole feed. The thread runs only while someone is
/// listening; samples sent while nobody is wait in the channel. A single fetch returns the
/// next sample read, and must not be issued from inside a sink of the same source.
///
/// When every sender is dropped, subscribers receive [`LocationError::Disconnected`] and
/// the source stays closed: later subscriptions and fetches fail with that error.
///
/// Cloning yields another handle to the same feed. Wrap a receiver once and clone the
/// source; two sources over clones of one receiver would split the samples between them.
#[derive(Clone)]
pub struct ChannelSource {
    feed: Arc<Feed>,
}

impl ChannelSource {
    /// Wrap an existing receiver.
    pub fn new(rx: Receiver<Sample>) -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            feed: Arc::new(Feed {
                rx,
                hub: Mutex::default(),
                wake_tx,
                wake_rx,
            }),
        }
    }

    /// Create an unbounded feed and the sender that drives it.
    pub fn unbounded() -> (Sender<Sample>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self::new(rx))
    }

    /// Create a feed that holds at most `cap` undelivered samples, applying backpressure to
    /// the producer when the sessions fall behind.
    pub fn bounded(cap: usize) -> (Sender<Sample>, Self) {
        let (tx, rx) = bounded(cap);
        (tx, Self::new(rx))
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.feed.lock().subscribers.len()
    }
}

impl LocationSource for ChannelSource {
    fn subscribe(
        &self,
        sink: SampleSink,
        _options: &WatchOptions,
    ) -> Result<Subscription, LocationError> {
        let mut hub = self.feed.lock();
        if hub.closed {
            return Err(LocationError::Disconnected);
        }
        let id = hub.next_id();
        hub.subscribers.push((id, Arc::new(Mutex::new(sink))));
        if let Err(error) = self.feed.ensure_reader(&mut hub) {
            hub.subscribers.retain(|(sub, _)| *sub != id);
            return Err(error);
        }
        drop(hub);

        // Never join the reader here: cancellation may come from inside a sink.
        let feed: Weak<Feed> = Arc::downgrade(&self.feed);
        Ok(Subscription::new(move || {
            if let Some(feed) = feed.upgrade() {
                feed.withdraw(id);
            }
        }))
    }

    fn current_position(&self, options: &WatchOptions) -> Result<GeoPoint, LocationError> {
        // `maximum_age` has no meaning here: the channel holds no cached fix.
        let (tx, rx) = bounded(1);
        let id = {
            let mut hub = self.feed.lock();
            if hub.closed {
                return Err(LocationError::Disconnected);
            }
            let id = hub.next_id();
            hub.fetches.push((id, tx));
            if let Err(error) = self.feed.ensure_reader(&mut hub) {
                hub.fetches.retain(|(fetch, _)| *fetch != id);
                return Err(error);
            }
            id
        };

        let received = match options.timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => LocationError::Timeout,
                RecvTimeoutError::Disconnected => LocationError::Disconnected,
            }),
            None => rx.recv().map_err(|_| LocationError::Disconnected),
        };
        match received {
            Ok(sample) => sample,
            Err(error) => {
                self.feed.withdraw(id);
                // The reader delivers under the hub lock, so a sample that raced the
                // timeout is already buffered here.
                rx.try_recv().unwrap_or(Err(error))
            }
        }
    }
}

impl fmt::Debug for ChannelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hub = self.feed.lock();
        f.debug_struct("ChannelSource")
            .field("subscribers", &hub.subscribers.len())
            .field("pending_fetches", &hub.fetches.len())
            .field("reading", &hub.reading)
            .field("closed", &hub.closed)
            .finish_non_exhaustive()
    }
}
