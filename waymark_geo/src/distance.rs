// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Great-circle distance and its display form.

use alloc::format;
use alloc::string::String;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::point::GeoPoint;

/// Mean Earth radius used by every distance computation in Waymark.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between `a` and `b` in meters, using the Haversine formula.
///
/// The result is non-negative, symmetric up to rounding, and exactly `0.0` when both points
/// have identical coordinates. Antipodal points and poles are handled without producing
/// `NaN`. Timestamps are ignored.
///
/// ```
/// use waymark_geo::{GeoPoint, distance_meters};
///
/// let a = GeoPoint::new(51.5007, -0.1246);
/// let b = GeoPoint::new(40.6892, -74.0445);
/// let km = distance_meters(&a, &b) / 1000.0;
/// assert!((km - 5574.8).abs() < 1.0);
/// ```
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let sin_phi = (d_phi / 2.0).sin();
    let sin_lambda = (d_lambda / 2.0).sin();
    // Rounding can push `h` a hair past 1 for antipodal inputs.
    let h = sin_phi * sin_phi + phi1.cos() * phi2.cos() * sin_lambda * sin_lambda;
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Render a distance for display.
///
/// The value is rounded to whole meters first. Below one kilometer it is shown in meters
/// (`"250 m"`); otherwise in kilometers with one decimal (`"1.5 km"`). Negative and `NaN`
/// inputs read as zero.
///
/// ```
/// use waymark_geo::format_distance;
///
/// assert_eq!(format_distance(249.6), "250 m");
/// assert_eq!(format_distance(999.6), "1.0 km");
/// assert_eq!(format_distance(1_500.0), "1.5 km");
/// ```
pub fn format_distance(meters: f64) -> String {
    // Also folds `-0.0` and `NaN` into `0.0`.
    let meters = if meters > 0.0 { meters.round() } else { 0.0 };
    if meters < 1000.0 {
        format!("{meters} m")
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}
