//! Creates an admin user, or resets the password of an existing one.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use hrm_attendance::auth::password::hash_password;
use hrm_attendance::db::init_db;
use hrm_attendance::model::role::Role;
use hrm_attendance::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Create or reset an admin account")]
struct Args {
    #[arg(long)]
    username: String,

    /// Read from ADMIN_PASSWORD when omitted
    #[arg(long)]
    password: Option<String>,

    /// Link the account to an employee record
    #[arg(long)]
    employee_id: Option<u64>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    telemetry::init_stderr();

    let username = args.username.trim().to_lowercase();
    if username.is_empty() {
        bail!("username must not be empty");
    }

    let password = match args.password {
        Some(p) => p,
        None => std::env::var("ADMIN_PASSWORD")
            .context("pass --password or set ADMIN_PASSWORD")?,
    };
    if password.len() < 8 {
        bail!("password must be at least 8 characters");
    }

    let hashed = hash_password(&password).map_err(|e| anyhow!("failed to hash password: {e}"))?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db(&database_url).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password, role_id, employee_id, is_active)
        VALUES (?, ?, ?, ?, TRUE)
        ON DUPLICATE KEY UPDATE
            password = VALUES(password),
            role_id = VALUES(role_id),
            employee_id = COALESCE(VALUES(employee_id), employee_id),
            is_active = TRUE
        "#,
    )
    .bind(&username)
    .bind(&hashed)
    .bind(Role::Admin.id())
    .bind(args.employee_id)
    .execute(&pool)
    .await
    .context("failed to write admin user")?;

    // MySQL reports 1 for an insert and 2 for an update
    let action = if result.rows_affected() == 1 {
        "created"
    } else {
        "updated"
    };
    info!(%username, action, "Admin account ready");
    println!("admin '{username}' {action}");

    Ok(())
}
