// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ready-made [`LocationSource`](crate::LocationSource) implementations.
//!
//! - [`ScriptedSource`]: samples are pushed by hand and delivered synchronously on the
//!   caller's thread. Useful for tests, simulations and hosts that receive positions
//!   through their own event loop.
//! - [`ChannelSource`]: samples are read from a `crossbeam_channel` receiver on a
//!   background thread and handed to every session, so any producer thread (a GPS
//!   reader, a replayed trace) can feed them.

mod channel;
mod scripted;

pub use channel::{ChannelSource, Sample};
pub use scripted::ScriptedSource;
