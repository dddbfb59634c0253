// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Waymark Geo: spherical distance and circular geofences.
//!
//! This crate holds the pure, stateless half of Waymark:
//!
//! - [`GeoPoint`]: an immutable latitude/longitude sample with an optional timestamp.
//! - [`distance_meters`]: great-circle distance using the Haversine formula on a sphere of
//!   radius [`EARTH_RADIUS_METERS`].
//! - [`Geofence`]: a validated circular region owned by an opaque campaign or entity id.
//! - [`is_within`]: inclusive containment test (`distance <= radius`).
//! - [`format_distance`]: a small display helper for UI layers.
//!
//! Stateful enter/exit tracking lives in `waymark_tracker`, and platform location feeds live
//! in `waymark_watch`.
//!
//! # Example
//!
//! ```rust
//! use waymark_geo::{FenceRecord, GeoPoint, Geofence, distance_meters, format_distance, is_within};
//!
//! let store = Geofence::from_record(
//!     "store-12",
//!     "campaign-7",
//!     FenceRecord { lat: 40.0, lng: -74.0, radius: 500.0 },
//! )
//! .unwrap();
//!
//! let here = GeoPoint::new(40.004, -74.0);
//! assert!(is_within(&here, &store));
//!
//! let d = distance_meters(&here, store.center());
//! assert_eq!(format_distance(d), "445 m");
//! ```
//!
//! ## Accuracy
//!
//! Distances assume a spherical Earth. Expect errors around 0.5% compared to an ellipsoidal
//! model, which is fine for proximity radii from meters to tens of kilometers but not for
//! survey work.
//!
//! ## Features
//!
//! - `std` (default): use `std` float math.
//! - `libm`: `no_std` float math through `kurbo`'s `libm` support.
//! - `serde`: derive `Serialize`/`Deserialize` for [`GeoPoint`] and [`FenceRecord`], and
//!   `Serialize` for [`Geofence`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod distance;
mod fence;
mod point;

pub use distance::{EARTH_RADIUS_METERS, distance_meters, format_distance};
pub use fence::{FenceRecord, Geofence, GeofenceError, is_within};
pub use point::GeoPoint;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_round_trip_through_public_api() {
        let fence = Geofence::new("f", GeoPoint::new(40.0, -74.0), 500.0, "owner").unwrap();

        // Sample A sits on the center, B is ~555 m north, C is ~444 m north.
        let a = GeoPoint::new(40.0, -74.0);
        let b = GeoPoint::new(40.005, -74.0);
        let c = GeoPoint::new(40.004, -74.0);

        assert!(is_within(&a, &fence));
        assert!(!is_within(&b, &fence), "~555 m is outside a 500 m fence");
        assert!(is_within(&c, &fence), "~444 m is inside a 500 m fence");
    }

    #[test]
    fn malformed_fences_never_reach_containment() {
        let center = GeoPoint::new(0.0, 0.0);
        assert!(Geofence::new("zero", center, 0.0, "o").is_err());
        assert!(Geofence::new("neg", center, -5.0, "o").is_err());
    }
}
