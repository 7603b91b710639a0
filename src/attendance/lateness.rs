//! Late-arrival computation against a shift start in a fixed civil timezone.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;
use crate::model::attendance::AttendanceStatus;

const SHIFT_START_FORMAT: &str = "%H:%M";

/// Shift start as a wall-clock time in a named IANA zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftConfig {
    timezone: Tz,
    shift_start: NaiveTime,
}

impl ShiftConfig {
    pub fn new(timezone: Tz, shift_start: NaiveTime) -> Self {
        Self {
            timezone,
            shift_start,
        }
    }

    /// Parses an IANA zone name and an `HH:MM` start time.
    pub fn parse(timezone_id: &str, shift_start: &str) -> Result<Self, AttendanceError> {
        let timezone: Tz = timezone_id.trim().parse().map_err(|_| {
            AttendanceError::InvalidTimeConfig(format!("unknown timezone '{timezone_id}'"))
        })?;

        let shift_start = NaiveTime::parse_from_str(shift_start.trim(), SHIFT_START_FORMAT)
            .map_err(|e| {
                AttendanceError::InvalidTimeConfig(format!(
                    "shift start '{shift_start}' is not HH:MM: {e}"
                ))
            })?;

        Ok(Self::new(timezone, shift_start))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Shift start formatted back as `HH:MM`.
    pub fn shift_start_label(&self) -> String {
        self.shift_start.format(SHIFT_START_FORMAT).to_string()
    }

    /// The civil date of `instant` in the shift timezone.
    pub fn calendar_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// The absolute instant at which the shift starts on `date`.
    ///
    /// A start inside a DST gap keeps the offset in effect before the gap
    /// (02:30 on a spring-forward night becomes 03:30). An ambiguous start
    /// on a fall-back night resolves to the earlier of the two instants.
    pub fn shift_start_instant(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(self.shift_start);

        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let before = self
                    .timezone
                    .offset_from_utc_datetime(&(local - TimeDelta::days(1)))
                    .fix();
                let utc = local - TimeDelta::seconds(i64::from(before.local_minus_utc()));
                Utc.from_utc_datetime(&utc)
            }
        }
    }
}

/// Lateness of a single check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LateArrival {
    pub is_late: bool,
    /// Zero exactly when `is_late` is false.
    #[schema(example = 15)]
    pub late_minutes: u32,
}

impl LateArrival {
    pub const ON_TIME: LateArrival = LateArrival {
        is_late: false,
        late_minutes: 0,
    };

    pub fn status(&self) -> AttendanceStatus {
        if self.is_late {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }
}

/// Evaluates `check_in` against the shift start on `calendar_date`.
///
/// A check-in exactly at shift start is on time. Partial minutes round up,
/// so thirty seconds late is one late minute. `calendar_date` is taken as
/// given even when it differs from the check-in's own date.
pub fn evaluate<Z: TimeZone>(
    check_in: &DateTime<Z>,
    calendar_date: NaiveDate,
    config: &ShiftConfig,
) -> LateArrival {
    let shift_start = config.shift_start_instant(calendar_date);
    let late_by = check_in.with_timezone(&Utc) - shift_start;

    if late_by <= TimeDelta::zero() {
        return LateArrival::ON_TIME;
    }

    let whole = late_by.num_minutes();
    let minutes = if late_by > TimeDelta::minutes(whole) {
        whole + 1
    } else {
        whole
    };

    LateArrival {
        is_late: true,
        late_minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
    }
}
