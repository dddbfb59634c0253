// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geographic sample type.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::distance::EARTH_RADIUS_METERS;
use crate::fence::GeofenceError;

/// A latitude/longitude pair in degrees, optionally stamped with the time it was observed.
///
/// Points are plain values: a location feed produces a fresh `GeoPoint` per sample and
/// nothing in Waymark mutates one after the fact.
///
/// Latitude is expected in `[-90, 90]` and longitude in `[-180, 180]`. [`GeoPoint::new`]
/// does not check this; use [`GeoPoint::try_new`] at trust boundaries.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
    /// Observation time in milliseconds since the Unix epoch, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<u64>,
}

impl GeoPoint {
    /// Create an untimestamped point without range checks.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: None,
        }
    }

    /// Create a point, rejecting non-finite or out-of-range coordinates.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeofenceError> {
        let point = Self::new(latitude, longitude);
        point.validate()?;
        Ok(point)
    }

    /// Return a copy of this point stamped with `timestamp` (Unix milliseconds).
    #[must_use]
    pub const fn with_timestamp(self, timestamp: u64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    /// Check that both coordinates are finite and within their valid ranges.
    pub fn validate(&self) -> Result<(), GeofenceError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeofenceError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeofenceError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Returns `true` if both points have identical coordinates, ignoring timestamps.
    pub fn same_position(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// The point reached by travelling `meters` from `self` along the great circle with
    /// initial bearing `bearing_degrees` (clockwise from north).
    ///
    /// Uses the same spherical model as [`distance_meters`](crate::distance_meters), so
    /// `distance_meters(p, p.destination(b, d))` is `d` up to rounding. The returned point
    /// carries no timestamp and its longitude is normalized to `[-180, 180)`.
    #[must_use]
    pub fn destination(&self, bearing_degrees: f64, meters: f64) -> Self {
        let delta = meters / EARTH_RADIUS_METERS;
        let theta = bearing_degrees.to_radians();
        let phi1 = self.latitude.to_radians();
        let lambda1 = self.longitude.to_radians();

        let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
        let sin_phi2 = sin_phi2.clamp(-1.0, 1.0);
        let phi2 = sin_phi2.atan2((1.0 - sin_phi2 * sin_phi2).sqrt());
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

        let longitude = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
        Self::new(phi2.to_degrees(), longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance_meters;

    #[test]
    fn try_new_checks_ranges() {
        assert!(GeoPoint::try_new(45.0, 120.0).is_ok());
        assert!(GeoPoint::try_new(90.0, -180.0).is_ok());
        assert_eq!(
            GeoPoint::try_new(90.5, 0.0),
            Err(GeofenceError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            GeoPoint::try_new(0.0, 181.0),
            Err(GeofenceError::LongitudeOutOfRange(181.0))
        );
        assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::try_new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn timestamp_does_not_affect_position() {
        let a = GeoPoint::new(10.0, 20.0);
        let b = a.with_timestamp(1_700_000_000_000);
        assert_eq!(b.timestamp, Some(1_700_000_000_000));
        assert!(a.same_position(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn destination_matches_distance() {
        let origin = GeoPoint::new(40.0, -74.0);
        for bearing in [0.0, 45.0, 90.0, 180.0, 271.0] {
            let p = origin.destination(bearing, 1_234.0);
            let d = distance_meters(&origin, &p);
            assert!((d - 1_234.0).abs() < 1e-6, "bearing {bearing}: got {d}");
        }
    }

    #[test]
    fn destination_north_moves_latitude_only() {
        let origin = GeoPoint::new(0.0, 10.0);
        let p = origin.destination(0.0, 10_000.0);
        assert!(p.latitude > 0.0);
        assert!((p.longitude - 10.0).abs() < 1e-9);
    }

    #[test]
    fn destination_wraps_antimeridian() {
        let origin = GeoPoint::new(0.0, 179.99);
        let p = origin.destination(90.0, 5_000.0);
        assert!(p.longitude < -179.9, "expected wrap, got {}", p.longitude);
    }
}
