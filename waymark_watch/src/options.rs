// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Options forwarded to location sources.

use std::time::Duration;

/// Hints passed through to a [`LocationSource`](crate::LocationSource).
///
/// Waymark itself does not interpret these; each source maps them onto whatever its
/// platform offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchOptions {
    /// Prefer precise positioning (GPS) over coarse network fixes.
    pub high_accuracy: bool,
    /// Longest time to wait for a single sample, or `None` to wait indefinitely.
    pub timeout: Option<Duration>,
    /// Oldest cached position the source may return, or `None` for any age.
    pub maximum_age: Option<Duration>,
}

impl Default for WatchOptions {
    /// High accuracy, a ten second timeout and no cached positions.
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Some(Duration::from_secs(10)),
            maximum_age: Some(Duration::ZERO),
        }
    }
}

impl WatchOptions {
    /// Set [`WatchOptions::high_accuracy`].
    #[must_use]
    pub const fn with_high_accuracy(mut self, high_accuracy: bool) -> Self {
        self.high_accuracy = high_accuracy;
        self
    }

    /// Set [`WatchOptions::timeout`].
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set [`WatchOptions::maximum_age`].
    #[must_use]
    pub const fn with_maximum_age(mut self, maximum_age: Option<Duration>) -> Self {
        self.maximum_age = maximum_age;
        self
    }
}
