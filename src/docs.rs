use crate::api::attendance::{
    AttendanceListResponse, CheckInRequest, CheckInResponse,
    LocationCheckResponse, PolicyResponse, RecalculateRequest, UpdatePolicy,
};
use crate::attendance::recalculate::RecalculateSummary;
use crate::auth::handlers::{LoginRequest, TokenPair};
use crate::config::DEFAULT_API_PREFIX;
use crate::model::attendance::Attendance;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance

Check-in and check-out for employees of an HRM system.

### Key Features
- **Geofenced check-in**
  - The reported location must lie within the configured radius of the office
- **Late arrival tracking**
  - Lateness is computed against the shift start in the configured timezone
- **Policy management**
  - Admins can swap the live office/shift policy and re-derive stored lateness

### Security
Endpoints under the API prefix require a **JWT Bearer** access token.
Policy changes and recalculation are **Admin** only.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::location_check,
        crate::api::attendance::get_policy,
        crate::api::attendance::update_policy,
        crate::api::attendance::recalculate
    ),
    components(
        schemas(
            LoginRequest,
            TokenPair,
            Attendance,
            AttendanceListResponse,
            CheckInRequest,
            CheckInResponse,
            LocationCheckResponse,
            PolicyResponse,
            UpdatePolicy,
            RecalculateRequest,
            RecalculateSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

/// The path attributes are written against [`DEFAULT_API_PREFIX`]; this
/// rebases them onto the prefix the protected scope is actually mounted at.
pub fn openapi_for_prefix(prefix: &str) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let prefix = prefix.trim_end_matches('/');

    let paths = std::mem::take(&mut doc.paths.paths);
    doc.paths.paths = paths
        .into_iter()
        .map(|(path, item)| {
            let rebased = path
                .strip_prefix(DEFAULT_API_PREFIX)
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
                .map(|rest| format!("{prefix}{rest}"));
            (rebased.unwrap_or(path), item)
        })
        .collect();

    doc
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
