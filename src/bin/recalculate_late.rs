//! Re-derives `is_late`/`late_minutes` for a date range under the shift
//! policy currently in the environment.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use hrm_attendance::attendance::recalculate::{DEFAULT_BATCH_SIZE, recalculate_late_status};
use hrm_attendance::config::policy_from_env;
use hrm_attendance::db::init_db;
use hrm_attendance::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Recalculate late status of stored check-ins")]
struct Args {
    /// First attendance date to recheck (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,

    /// Last attendance date to recheck, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_stderr();

    let policy = policy_from_env()?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db(&database_url).await?;

    info!(
        timezone = policy.shift.timezone().name(),
        shift_start = %policy.shift.shift_start_label(),
        "Recalculating with current policy"
    );

    let summary = recalculate_late_status(
        &pool,
        &policy,
        args.from,
        args.to,
        args.dry_run,
        args.batch_size,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
