use crate::{
    api::attendance,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Milliseconds between replenished requests for a per-minute budget.
fn replenish_interval_ms(requests_per_min: u32) -> u64 {
    if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    }
}

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(replenish_interval_ms(requests_per_min))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(GovernorConfig::default);
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/check-out").route(web::put().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/location-check")
                            .route(web::post().to(attendance::location_check)),
                    )
                    // /attendance/policy
                    .service(
                        web::resource("/policy")
                            .route(web::get().to(attendance::get_policy))
                            .route(web::put().to(attendance::update_policy)),
                    )
                    .service(
                        web::resource("/recalculate")
                            .route(web::post().to(attendance::recalculate)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replenish_interval_spreads_budget_over_a_minute() {
        assert_eq!(replenish_interval_ms(60), 1_000);
        assert_eq!(replenish_interval_ms(1000), 60);
        assert_eq!(replenish_interval_ms(0), 1);
        assert_eq!(replenish_interval_ms(120_000), 1);
    }
}
