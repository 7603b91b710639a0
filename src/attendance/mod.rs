pub mod geo;
pub mod lateness;
pub mod recalculate;

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::error::AttendanceError;
use geo::{GeoCheck, GeoPoint, OfficeGeoConfig};
use lateness::{LateArrival, ShiftConfig};

/// Office geofence plus shift start. One immutable snapshot per version.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePolicy {
    pub office: OfficeGeoConfig,
    pub shift: ShiftConfig,
}

/// Result of running both checks for one check-in event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckInOutcome {
    pub calendar_date: NaiveDate,
    pub location: GeoCheck,
    pub lateness: LateArrival,
}

impl AttendancePolicy {
    pub fn check_location(&self, reported: &GeoPoint) -> GeoCheck {
        geo::validate(reported, &self.office)
    }

    pub fn check_lateness(&self, check_in: DateTime<Utc>, calendar_date: NaiveDate) -> LateArrival {
        lateness::evaluate(&check_in, calendar_date, &self.shift)
    }

    /// Runs the geofence and the lateness check for a check-in observed at
    /// `check_in`. The attendance date is the civil date in the shift zone.
    /// Fails with [`AttendanceError::OutsideGeofence`] when the location is
    /// outside the radius.
    pub fn evaluate_check_in(
        &self,
        reported: &GeoPoint,
        check_in: DateTime<Utc>,
    ) -> Result<CheckInOutcome, AttendanceError> {
        let location = self.check_location(reported);
        if !location.valid {
            return Err(AttendanceError::OutsideGeofence {
                distance_meters: location.rounded_distance(),
                radius_meters: self.office.radius_meters,
            });
        }

        let calendar_date = self.shift.calendar_date(check_in);
        let lateness = self.check_lateness(check_in, calendar_date);

        Ok(CheckInOutcome {
            calendar_date,
            location,
            lateness,
        })
    }
}

/// Shared handle to the live policy.
///
/// Readers take a whole snapshot with [`PolicyHandle::current`]; a
/// replacement swaps in a new snapshot atomically, so an in-flight
/// evaluation always sees one complete version.
#[derive(Clone)]
pub struct PolicyHandle {
    inner: Arc<ArcSwap<AttendancePolicy>>,
}

impl PolicyHandle {
    pub fn new(policy: AttendancePolicy) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(policy)),
        }
    }

    pub fn current(&self) -> Arc<AttendancePolicy> {
        self.inner.load_full()
    }

    pub fn replace(&self, policy: AttendancePolicy) {
        info!(
            office_latitude = policy.office.center.latitude,
            office_longitude = policy.office.center.longitude,
            radius_meters = policy.office.radius_meters,
            timezone = policy.shift.timezone().name(),
            shift_start = %policy.shift.shift_start_label(),
            "Attendance policy replaced"
        );
        self.inner.store(Arc::new(policy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(shift_start: &str) -> AttendancePolicy {
        AttendancePolicy {
            office: OfficeGeoConfig::new(GeoPoint::new_unchecked(28.6139, 77.2090), 200.0)
                .unwrap(),
            shift: ShiftConfig::parse("Asia/Kolkata", shift_start).unwrap(),
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn evaluates_on_site_late_check_in() {
        let outcome = policy("10:00")
            .evaluate_check_in(
                &GeoPoint::new_unchecked(28.6140, 77.2091),
                at("2024-11-20T10:15:00+05:30"),
            )
            .unwrap();

        assert!(outcome.location.valid);
        assert_eq!(
            outcome.calendar_date,
            NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
        );
        assert_eq!(outcome.lateness.late_minutes, 15);
    }

    #[test]
    fn rejects_off_site_check_in() {
        let err = policy("10:00")
            .evaluate_check_in(
                &GeoPoint::new_unchecked(28.6589, 77.2090),
                at("2024-11-20T09:00:00+05:30"),
            )
            .unwrap_err();

        match err {
            AttendanceError::OutsideGeofence {
                distance_meters,
                radius_meters,
            } => {
                assert!(distance_meters > 4_900);
                assert_eq!(radius_meters, 200.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn replaced_policy_is_seen_by_new_readers_only() {
        let handle = PolicyHandle::new(policy("10:00"));
        let before = handle.current();

        handle.replace(policy("09:30"));
        let after = handle.current();

        let check_in = at("2024-11-20T09:45:00+05:30");
        let day = NaiveDate::from_ymd_opt(2024, 11, 20).unwrap();

        assert!(!before.check_lateness(check_in, day).is_late);
        assert_eq!(after.check_lateness(check_in, day).late_minutes, 15);
    }
}
