// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Waymark Watch: geofence watch sessions over pluggable location sources.
//!
//! ## Overview
//!
//! A watch session connects three pieces:
//!
//! - a [`LocationSource`] that produces position samples (a device location service, a
//!   replayed trace, a test script),
//! - a [`Registry`](waymark_tracker::Registry) of fences evaluated by a fresh
//!   [`Tracker`](waymark_tracker::Tracker),
//! - a [`GeofenceListener`] that receives `on_location_update`, `on_geofence_enter`,
//!   `on_geofence_exit` and `on_error` synchronously for every delivery.
//!
//! [`watch`] starts a session and returns a [`WatchHandle`]; stopping it is idempotent and
//! silences the session immediately. Failed samples are reported to the listener and leave
//! the session running, except for terminal failures such as a closed feed. A source with
//! no location capability makes [`watch`] and [`current_position`] fail synchronously with
//! [`LocationError::Unsupported`].
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use waymark_geo::{FenceRecord, GeoPoint};
//! use waymark_tracker::Registry;
//! use waymark_watch::{Callbacks, ScriptedSource, WatchOptions, watch};
//!
//! let registry = Registry::from_records(
//!     "campaign-42",
//!     [("cafe", FenceRecord { lat: 40.0, lng: -74.0, radius: 500.0 })],
//! )
//! .unwrap();
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let (enter_log, exit_log) = (Arc::clone(&log), Arc::clone(&log));
//! let listener = Callbacks::new()
//!     .on_enter(move |f, _| enter_log.lock().unwrap().push(format!("enter {}", f.id())))
//!     .on_exit(move |f, _| exit_log.lock().unwrap().push(format!("exit {}", f.id())));
//!
//! let source = ScriptedSource::new();
//! let session = watch(&source, registry, listener, &WatchOptions::default()).unwrap();
//! source.push(GeoPoint::new(40.0, -74.0));
//! source.push(GeoPoint::new(40.005, -74.0));
//! source.push(GeoPoint::new(40.004, -74.0));
//! session.stop();
//!
//! assert_eq!(*log.lock().unwrap(), ["enter cafe", "exit cafe", "enter cafe"]);
//! ```
//!
//! ## Logging
//!
//! Session lifecycle and source failures are emitted as `tracing` events at `debug` and
//! `trace` level. No subscriber is installed; that is up to the application.

mod error;
mod listener;
mod options;
mod permission;
mod session;
mod source;
pub mod sources;

pub use error::LocationError;
pub use listener::{Callbacks, GeofenceListener};
pub use options::WatchOptions;
pub use permission::{PermissionState, query_permission};
pub use session::{WatchHandle, Watcher, current_position, watch};
pub use source::{LocationSource, SampleSink, Subscription};
pub use sources::{ChannelSource, ScriptedSource};
