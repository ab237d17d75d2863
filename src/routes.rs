use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use tracing::warn;

use crate::{
    api::{attendance, leave_policy, leave_request, leave_type, work_schedule},
    auth::middleware::auth_middleware,
    config::Config,
};

/// Per-IP limiter. `None` when the configured rate is rejected by the builder.
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let Some(protected_limiter) = build_limiter(config.rate_protected_per_min).map(Arc::new) else {
        warn!(
            rate = config.rate_protected_per_min,
            "Invalid rate limit configuration, API routes not registered"
        );
        return;
    };

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::create_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    // /attendance/summary/{employee_id}
                    .service(
                        web::resource("/summary/{employee_id}")
                            .route(web::get().to(attendance::attendance_summary)),
                    )
                    // /attendance/work-schedules
                    .service(
                        web::resource("/work-schedules")
                            .route(web::post().to(work_schedule::create_schedule))
                            .route(web::get().to(work_schedule::list_schedules)),
                    )
                    .service(
                        web::resource("/work-schedules/{id}")
                            .route(web::get().to(work_schedule::get_schedule))
                            .route(web::patch().to(work_schedule::update_schedule))
                            .route(web::delete().to(work_schedule::delete_schedule)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::patch().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    // /leaves/types
                    .service(
                        web::resource("/types")
                            .route(web::post().to(leave_type::create_leave_type))
                            .route(web::get().to(leave_type::list_leave_types)),
                    )
                    .service(
                        web::resource("/types/{id}")
                            .route(web::get().to(leave_type::get_leave_type))
                            .route(web::patch().to(leave_type::update_leave_type))
                            .route(web::delete().to(leave_type::delete_leave_type)),
                    )
                    // /leaves/requests
                    .service(
                        web::resource("/requests")
                            .route(web::post().to(leave_request::create_leave))
                            .route(web::get().to(leave_request::leave_list)),
                    )
                    .service(
                        web::resource("/requests/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::patch().to(leave_request::update_leave)),
                    )
                    .service(
                        web::resource("/requests/{id}/approve")
                            .route(web::post().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/requests/{id}/reject")
                            .route(web::post().to(leave_request::reject_leave)),
                    )
                    .service(
                        web::resource("/requests/{id}/cancel")
                            .route(web::post().to(leave_request::cancel_leave)),
                    )
                    // /leaves/balances/{employee_id}
                    .service(
                        web::resource("/balances/{employee_id}")
                            .route(web::get().to(leave_request::leave_balances)),
                    )
                    // /leaves/policies
                    .service(
                        web::resource("/policies")
                            .route(web::post().to(leave_policy::create_policy))
                            .route(web::get().to(leave_policy::list_policies)),
                    )
                    .service(
                        web::resource("/policies/{id}")
                            .route(web::get().to(leave_policy::get_policy))
                            .route(web::patch().to(leave_policy::update_policy))
                            .route(web::delete().to(leave_policy::delete_policy)),
                    ),
            ),
    );
}
