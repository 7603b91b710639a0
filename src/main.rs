use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use hrm_attendance::attendance::PolicyHandle;
use hrm_attendance::config::Config;
use hrm_attendance::db::init_db;
use hrm_attendance::docs::openapi_for_prefix;
use hrm_attendance::{routes, telemetry};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // refuse to start on a missing or unparseable policy
    let config = Config::from_env()?;

    let _guard = telemetry::init(&config.log_dir, "app.log");

    let policy = PolicyHandle::new(config.attendance_policy.clone());
    info!(
        timezone = config.attendance_policy.shift.timezone().name(),
        shift_start = %config.attendance_policy.shift.shift_start_label(),
        radius_meters = config.attendance_policy.office.radius_meters,
        "Server starting..."
    );

    let pool = init_db(&config.database_url).await?;
    let server_addr = config.server_addr.clone();

    let openapi = openapi_for_prefix(&config.api_prefix);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(policy.clone()))
            .service(index)
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await
    .context("Server error")
}
