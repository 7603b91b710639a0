use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Errors raised while validating and recording attendance.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Latitude/longitude missing, non-finite or out of range.
    #[error("invalid location: {0}")]
    InvalidLocationInput(String),

    /// Malformed shift start time or unknown timezone.
    #[error("invalid shift configuration: {0}")]
    InvalidTimeConfig(String),

    #[error("outside allowed check-in radius ({distance_meters} m from office, limit {radius_meters} m)")]
    OutsideGeofence {
        distance_meters: u64,
        radius_meters: f64,
    },

    #[error("invalid geofence configuration: {0}")]
    InvalidGeoConfig(String),

    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("No active check-in found for today")]
    NoActiveCheckIn,

    #[error("No employee profile")]
    NoEmployeeProfile,

    #[error("invalid date range: {from} is after {to}")]
    InvalidDateRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AttendanceError {
    /// True when the database rejected an insert on a unique key.
    pub fn is_duplicate_key(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23000"),
            _ => false,
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::InvalidLocationInput(_)
            | AttendanceError::InvalidTimeConfig(_)
            | AttendanceError::InvalidGeoConfig(_)
            | AttendanceError::OutsideGeofence { .. }
            | AttendanceError::AlreadyCheckedIn
            | AttendanceError::NoActiveCheckIn
            | AttendanceError::InvalidDateRange { .. } => StatusCode::BAD_REQUEST,
            AttendanceError::NoEmployeeProfile => StatusCode::FORBIDDEN,
            AttendanceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AttendanceError::OutsideGeofence {
                distance_meters,
                radius_meters,
            } => json!({
                "error": "Outside allowed check-in radius",
                "distance_meters": distance_meters,
                "radius_meters": radius_meters,
                "location_valid": false,
            }),
            AttendanceError::Database(e) => {
                tracing::error!(error = %e, "Attendance database error");
                json!({ "error": "Internal Server Error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
