use crate::{
    api::{attendance, report},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Field edits fire at keystroke rate, so the attendance scope gets a
    // much higher budget than the report scope.
    let attendance_limiter = Arc::new(build_limiter(config.rate_attendance_per_min));
    let report_limiter = Arc::new(build_limiter(config.rate_report_per_min));

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance
                .service(
                    web::resource("")
                        .wrap(attendance_limiter.clone())
                        .route(web::get().to(attendance::list_daily))
                        .route(web::post().to(attendance::mark_attendance)),
                )
                // /attendance/monthly
                .service(
                    web::resource("/monthly")
                        .wrap(attendance_limiter.clone())
                        .route(web::get().to(attendance::list_monthly)),
                )
                // /attendance/selection
                .service(
                    web::resource("/selection")
                        .wrap(attendance_limiter.clone())
                        .route(web::put().to(attendance::apply_selection)),
                )
                // /attendance/field
                .service(
                    web::resource("/field")
                        .wrap(attendance_limiter.clone())
                        .route(web::patch().to(attendance::edit_field)),
                )
                // /attendance/state
                .service(
                    web::resource("/state")
                        .wrap(attendance_limiter.clone())
                        .route(web::get().to(attendance::display_state)),
                )
                // /attendance/report/missed-hours
                .service(
                    web::resource("/report/missed-hours")
                        .wrap(report_limiter)
                        .route(web::get().to(report::missed_hours)),
                )
                // /attendance/{id}
                .service(
                    web::resource("/{id}")
                        .wrap(attendance_limiter)
                        .route(web::delete().to(attendance::delete_attendance)),
                ),
        ),
    );
}
