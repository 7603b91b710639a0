//! Re-derives stored lateness under the current policy.
//!
//! Stored `is_late`/`late_minutes` reflect whichever shift start was live at
//! check-in. After a policy change this pass rewrites the rows in a date
//! range so they agree with the current shift start. It is never run
//! implicitly.

use chrono::{DateTime, NaiveDate, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::attendance::AttendancePolicy;
use crate::attendance::lateness::LateArrival;
use crate::error::AttendanceError;

pub const DEFAULT_BATCH_SIZE: usize = 250;

#[derive(Debug, sqlx::FromRow)]
pub struct StoredCheckIn {
    pub id: u64,
    pub date: NaiveDate,
    pub check_in_at: DateTime<Utc>,
    pub is_late: bool,
    pub late_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatenessChange {
    pub id: u64,
    pub lateness: LateArrival,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecalculateSummary {
    /// Rows inspected in the range.
    pub scanned: u64,
    /// Rows whose stored lateness disagrees with the current policy.
    pub changed: u64,
    /// Rows rewritten; zero on a dry run.
    pub updated: u64,
    pub dry_run: bool,
}

/// Returns the corrected lateness when the stored values are stale.
pub fn rederive(row: &StoredCheckIn, policy: &AttendancePolicy) -> Option<LatenessChange> {
    let current = policy.check_lateness(row.check_in_at, row.date);
    let stored = LateArrival {
        is_late: row.is_late,
        late_minutes: row.late_minutes,
    };

    (current != stored).then_some(LatenessChange {
        id: row.id,
        lateness: current,
    })
}

/// Counts stale rows and groups them into write batches.
///
/// Batches are handed out once they reach `batch_size`; on a dry run no
/// batch is ever produced and `updated` stays zero.
#[derive(Debug)]
pub struct LatenessPlan<'a> {
    policy: &'a AttendancePolicy,
    batch_size: usize,
    pending: Vec<LatenessChange>,
    summary: RecalculateSummary,
}

impl<'a> LatenessPlan<'a> {
    pub fn new(policy: &'a AttendancePolicy, dry_run: bool, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);

        Self {
            policy,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            summary: RecalculateSummary {
                dry_run,
                ..Default::default()
            },
        }
    }

    /// Returns a full batch when this row completes one.
    pub fn observe(&mut self, row: &StoredCheckIn) -> Option<Vec<LatenessChange>> {
        self.summary.scanned += 1;

        let change = rederive(row, self.policy)?;
        self.summary.changed += 1;

        if self.summary.dry_run {
            return None;
        }

        self.pending.push(change);
        (self.pending.len() >= self.batch_size)
            .then(|| std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size)))
    }

    pub fn record_written(&mut self, rows: u64) {
        self.summary.updated += rows;
    }

    /// Remaining partial batch, if any.
    pub fn finish(&mut self) -> Option<Vec<LatenessChange>> {
        (!self.pending.is_empty()).then(|| std::mem::take(&mut self.pending))
    }

    pub fn summary(&self) -> RecalculateSummary {
        self.summary
    }
}

async fn apply_batch(pool: &MySqlPool, batch: &[LatenessChange]) -> Result<u64, AttendanceError> {
    let mut tx = pool.begin().await?;
    let mut updated = 0;

    for change in batch {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET is_late = ?, late_minutes = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(change.lateness.is_late)
        .bind(change.lateness.late_minutes)
        .bind(change.lateness.status().to_string())
        .bind(change.id)
        .execute(&mut *tx)
        .await?;

        updated += result.rows_affected();
    }

    tx.commit().await?;
    debug!(rows = updated, "Applied lateness batch");

    Ok(updated)
}

/// Streams check-ins dated `from..=to` and rewrites stale lateness in
/// batches of `batch_size`. With `dry_run` nothing is written.
pub async fn recalculate_late_status(
    pool: &MySqlPool,
    policy: &AttendancePolicy,
    from: NaiveDate,
    to: NaiveDate,
    dry_run: bool,
    batch_size: usize,
) -> Result<RecalculateSummary, AttendanceError> {
    if from > to {
        return Err(AttendanceError::InvalidDateRange { from, to });
    }

    let mut plan = LatenessPlan::new(policy, dry_run, batch_size);

    let mut stream = sqlx::query_as::<_, StoredCheckIn>(
        r#"
        SELECT id, date, check_in_at, is_late, late_minutes
        FROM attendance
        WHERE date BETWEEN ? AND ?
        ORDER BY id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch(pool);

    while let Some(row) = stream.next().await {
        if let Some(batch) = plan.observe(&row?) {
            plan.record_written(apply_batch(pool, &batch).await?);
        }
    }

    if let Some(batch) = plan.finish() {
        plan.record_written(apply_batch(pool, &batch).await?);
    }

    let summary = plan.summary();

    info!(
        %from,
        %to,
        scanned = summary.scanned,
        changed = summary.changed,
        updated = summary.updated,
        dry_run,
        "Late status recalculation complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::geo::{GeoPoint, OfficeGeoConfig};
    use crate::attendance::lateness::ShiftConfig;

    fn policy(shift_start: &str) -> AttendancePolicy {
        AttendancePolicy {
            office: OfficeGeoConfig::new(GeoPoint::new_unchecked(28.6139, 77.2090), 200.0)
                .unwrap(),
            shift: ShiftConfig::parse("Asia/Kolkata", shift_start).unwrap(),
        }
    }

    fn row(check_in: &str, is_late: bool, late_minutes: u32) -> StoredCheckIn {
        StoredCheckIn {
            id: 9,
            date: NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
            check_in_at: DateTime::parse_from_rfc3339(check_in)
                .unwrap()
                .with_timezone(&Utc),
            is_late,
            late_minutes,
        }
    }

    #[test]
    fn up_to_date_row_is_left_alone() {
        let stored = row("2024-11-20T10:15:00+05:30", true, 15);
        assert_eq!(rederive(&stored, &policy("10:00")), None);
    }

    #[test]
    fn earlier_shift_start_marks_row_late() {
        let stored = row("2024-11-20T09:45:00+05:30", false, 0);
        let change = rederive(&stored, &policy("09:30")).unwrap();

        assert_eq!(change.id, 9);
        assert_eq!(
            change.lateness,
            LateArrival {
                is_late: true,
                late_minutes: 15
            }
        );
    }

    #[test]
    fn later_shift_start_clears_lateness() {
        let stored = row("2024-11-20T10:15:00+05:30", true, 15);
        let change = rederive(&stored, &policy("10:30")).unwrap();

        assert_eq!(change.lateness, LateArrival::ON_TIME);
    }

    fn stored(id: u64, check_in: &str, is_late: bool, late_minutes: u32) -> StoredCheckIn {
        StoredCheckIn { id, ..row(check_in, is_late, late_minutes) }
    }

    // Under a 09:30 shift start: ids 1, 2, 4 and 5 are stale, 3 is current.
    fn mixed_rows() -> Vec<StoredCheckIn> {
        vec![
            stored(1, "2024-11-20T09:45:00+05:30", false, 0),
            stored(2, "2024-11-20T09:50:00+05:30", false, 0),
            stored(3, "2024-11-20T09:40:00+05:30", true, 10),
            stored(4, "2024-11-20T09:20:00+05:30", true, 5),
            stored(5, "2024-11-20T10:00:00+05:30", false, 0),
        ]
    }

    fn run(plan: &mut LatenessPlan<'_>, rows: &[StoredCheckIn]) -> Vec<Vec<u64>> {
        let mut batches = Vec::new();

        for row in rows {
            if let Some(batch) = plan.observe(row) {
                plan.record_written(batch.len() as u64);
                batches.push(batch);
            }
        }
        if let Some(batch) = plan.finish() {
            plan.record_written(batch.len() as u64);
            batches.push(batch);
        }

        batches
            .iter()
            .map(|batch| batch.iter().map(|change| change.id).collect())
            .collect()
    }

    #[test]
    fn writing_plan_flushes_full_batches_then_the_remainder() {
        let policy = policy("09:30");
        let mut plan = LatenessPlan::new(&policy, false, 3);

        let written = run(&mut plan, &mixed_rows());

        assert_eq!(written, vec![vec![1, 2, 4], vec![5]]);
        assert_eq!(
            plan.summary(),
            RecalculateSummary {
                scanned: 5,
                changed: 4,
                updated: 4,
                dry_run: false,
            }
        );
    }

    #[test]
    fn dry_run_counts_changes_without_writing() {
        let policy = policy("09:30");
        let mut plan = LatenessPlan::new(&policy, true, 2);

        let written = run(&mut plan, &mixed_rows());

        assert!(written.is_empty());
        let summary = plan.summary();
        assert_eq!(summary.scanned, 5);
        assert_eq!(summary.changed, 4);
        assert_eq!(summary.updated, 0);
        assert!(summary.dry_run);
    }

    #[test]
    fn zero_batch_size_still_makes_progress() {
        let policy = policy("09:30");
        let mut plan = LatenessPlan::new(&policy, false, 0);

        let written = run(&mut plan, &mixed_rows());

        assert_eq!(written.len(), 4);
        assert_eq!(plan.summary().updated, plan.summary().changed);
    }
}
