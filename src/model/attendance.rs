use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use utoipa::ToSchema;

/// Label stored alongside each attendance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
    /// Civil date in the shift timezone.
    #[schema(example = "2024-11-20", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2024-11-20T04:45:00Z", value_type = String, format = "date-time")]
    pub check_in_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub check_out_at: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    #[schema(nullable = true)]
    pub accuracy_meters: Option<f64>,
    #[schema(example = 42)]
    pub distance_meters: u32,
    pub is_late: bool,
    #[schema(example = 15)]
    pub late_minutes: u32,
    #[schema(example = "late")]
    pub status: String,
}
