// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Location permission queries.

use tracing::debug;

use crate::error::LocationError;
use crate::options::WatchOptions;
use crate::source::LocationSource;

/// Whether the application may read the device location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionState {
    /// Location access is allowed.
    Granted,
    /// Location access was refused.
    Denied,
    /// The user has not decided yet, or the answer could not be determined.
    Prompt,
}

/// Best-effort permission check.
///
/// Uses [`LocationSource::permission`] when the source can answer directly. Otherwise it
/// fetches one position and infers the state: success means [`PermissionState::Granted`],
/// [`LocationError::PermissionDenied`] and [`LocationError::Unsupported`] mean
/// [`PermissionState::Denied`], and any other failure means [`PermissionState::Prompt`].
/// A platform without location support has nothing to prompt for.
pub fn query_permission<S>(source: &S, options: &WatchOptions) -> PermissionState
where
    S: LocationSource + ?Sized,
{
    if let Some(state) = source.permission() {
        return state;
    }
    let inferred = match source.current_position(options) {
        Ok(_) => PermissionState::Granted,
        Err(LocationError::PermissionDenied | LocationError::Unsupported) => {
            PermissionState::Denied
        }
        Err(_) => PermissionState::Prompt,
    };
    debug!(?inferred, "inferred location permission from a position fetch");
    inferred
}
