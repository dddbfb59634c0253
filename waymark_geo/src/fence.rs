// Copyright 2025 the Waymark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circular geofences and the containment test.

use alloc::string::String;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Rect;

use crate::distance::{EARTH_RADIUS_METERS, distance_meters};
use crate::point::GeoPoint;

/// Reasons a geofence or point is rejected at construction time.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeofenceError {
    /// The radius was zero or negative.
    #[error("geofence {id:?} has non-positive radius {radius} m")]
    NonPositiveRadius {
        /// Id of the offending fence.
        id: String,
        /// The rejected radius.
        radius: f64,
    },
    /// The radius was `NaN` or infinite.
    #[error("geofence {id:?} has a non-finite radius")]
    NonFiniteRadius {
        /// Id of the offending fence.
        id: String,
    },
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    /// The fence id was empty.
    #[error("geofence id must not be empty")]
    EmptyId,
}

/// A plain `{lat, lng, radius}` record, as stored on a campaign's location target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FenceRecord {
    /// Center latitude in degrees.
    pub lat: f64,
    /// Center longitude in degrees.
    pub lng: f64,
    /// Radius in meters.
    pub radius: f64,
}

/// A circular region tied to an owning campaign or entity.
///
/// Fences are validated on construction: the id is non-empty, the center is a valid
/// coordinate and the radius is finite and strictly positive. Once built a fence is
/// read-only; the caller owns its lifecycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Geofence {
    id: String,
    center: GeoPoint,
    radius_meters: f64,
    owner_id: String,
}

impl Geofence {
    /// Build a fence, rejecting malformed input.
    pub fn new(
        id: impl Into<String>,
        center: GeoPoint,
        radius_meters: f64,
        owner_id: impl Into<String>,
    ) -> Result<Self, GeofenceError> {
        let id = id.into();
        if id.is_empty() {
            return Err(GeofenceError::EmptyId);
        }
        if !radius_meters.is_finite() {
            return Err(GeofenceError::NonFiniteRadius { id });
        }
        if radius_meters <= 0.0 {
            return Err(GeofenceError::NonPositiveRadius {
                id,
                radius: radius_meters,
            });
        }
        center.validate()?;
        Ok(Self {
            id,
            center: GeoPoint {
                timestamp: None,
                ..center
            },
            radius_meters,
            owner_id: owner_id.into(),
        })
    }

    /// Build a fence from a campaign's `{lat, lng, radius}` record.
    pub fn from_record(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        record: FenceRecord,
    ) -> Result<Self, GeofenceError> {
        Self::new(
            id,
            GeoPoint::new(record.lat, record.lng),
            record.radius,
            owner_id,
        )
    }

    /// Unique id of this fence.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Center of the circle (never timestamped).
    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    /// Radius in meters; always finite and positive.
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Opaque reference to the owning campaign or entity.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// The record this fence would be stored as.
    pub fn to_record(&self) -> FenceRecord {
        FenceRecord {
            lat: self.center.latitude,
            lng: self.center.longitude,
            radius: self.radius_meters,
        }
    }

    /// Shorthand for [`is_within`]`(point, self)`.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        is_within(point, self)
    }

    /// Degree-space bounding box of the circle, with `x` as longitude and `y` as latitude.
    ///
    /// Useful for fitting a map viewport. Returns `None` when the circle reaches a pole or
    /// crosses the antimeridian, since no single longitude interval encloses it then.
    pub fn bounds(&self) -> Option<Rect> {
        let delta = self.radius_meters / EARTH_RADIUS_METERS;
        let lat = self.center.latitude;
        let lng = self.center.longitude;

        let d_lat = delta.to_degrees();
        if lat + d_lat >= 90.0 || lat - d_lat <= -90.0 {
            return None;
        }

        // Widest longitude offset of a small circle on the sphere.
        let s = delta.sin() / lat.to_radians().cos();
        if s >= 1.0 {
            return None;
        }
        let d_lng = s.atan2((1.0 - s * s).sqrt()).to_degrees();
        if lng - d_lng < -180.0 || lng + d_lng > 180.0 {
            return None;
        }

        Some(Rect::new(lng - d_lng, lat - d_lat, lng + d_lng, lat + d_lat))
    }
}

/// Returns `true` if `point` lies inside `fence` or exactly on its boundary.
pub fn is_within(point: &GeoPoint, fence: &Geofence) -> bool {
    distance_meters(point, &fence.center) <= fence.radius_meters
}
