// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by location sources.

use thiserror::Error;

/// Failures reported by a [`LocationSource`](crate::LocationSource).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum LocationError {
    /// The user or platform refused access to location.
    #[error("location permission denied")]
    PermissionDenied,
    /// The source could not determine a position for this sample.
    #[error("position unavailable")]
    PositionUnavailable,
    /// No position arrived within the configured timeout.
    #[error("timed out waiting for a position")]
    Timeout,
    /// The platform has no location capability at all.
    #[error("location is not supported on this platform")]
    Unsupported,
    /// The underlying feed closed and will not produce further samples.
    #[error("location feed disconnected")]
    Disconnected,
}

impl LocationError {
    /// Returns `true` if no further samples can follow this error.
    ///
    /// Other errors apply to a single sample; a watch session stays active through them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unsupported | Self::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_feed_loss_is_terminal() {
        assert!(!LocationError::PermissionDenied.is_terminal());
        assert!(!LocationError::PositionUnavailable.is_terminal());
        assert!(!LocationError::Timeout.is_terminal());
        assert!(LocationError::Unsupported.is_terminal());
        assert!(LocationError::Disconnected.is_terminal());
    }
}
