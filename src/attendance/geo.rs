//! Geofence check for check-in locations.
//!
//! Distances use the haversine great-circle formula on a spherical Earth.
//! Oblateness is ignored, which is well inside tolerance for office-sized
//! radii.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 28.6139)]
    pub latitude: f64,
    #[schema(example = 77.2090)]
    pub longitude: f64,
}

impl GeoPoint {
    /// Builds a point without range checks. Use with trusted inputs only.
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point from raw payload values, rejecting missing,
    /// non-finite or out-of-range coordinates.
    pub fn try_new(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, AttendanceError> {
        let latitude = latitude
            .ok_or_else(|| AttendanceError::InvalidLocationInput("latitude is required".into()))?;
        let longitude = longitude
            .ok_or_else(|| AttendanceError::InvalidLocationInput("longitude is required".into()))?;

        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AttendanceError::InvalidLocationInput(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AttendanceError::InvalidLocationInput(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Office location and the radius inside which check-ins are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OfficeGeoConfig {
    pub center: GeoPoint,
    #[schema(example = 200.0)]
    pub radius_meters: f64,
}

impl OfficeGeoConfig {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self, AttendanceError> {
        GeoPoint::try_new(Some(center.latitude), Some(center.longitude))
            .map_err(|e| AttendanceError::InvalidGeoConfig(e.to_string()))?;

        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(AttendanceError::InvalidGeoConfig(format!(
                "radius {radius_meters} must be a non-negative number of meters"
            )));
        }

        Ok(Self {
            center,
            radius_meters,
        })
    }
}

/// Outcome of a geofence check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCheck {
    /// Raw distance; authoritative for `valid`.
    pub distance_meters: f64,
    pub valid: bool,
}

impl GeoCheck {
    /// Distance rounded to whole meters, for display.
    pub fn rounded_distance(&self) -> u64 {
        self.distance_meters.round() as u64
    }
}

pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (a.latitude - b.latitude).to_radians();
    let d_lambda = (a.longitude - b.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Checks `reported` against the office geofence. The boundary is inclusive.
///
/// `reported` must hold finite, in-range coordinates; build it with
/// [`GeoPoint::try_new`] when it comes from a request.
pub fn validate(reported: &GeoPoint, config: &OfficeGeoConfig) -> GeoCheck {
    let distance_meters = haversine_distance(reported, &config.center);

    GeoCheck {
        distance_meters,
        valid: distance_meters <= config.radius_meters,
    }
}
