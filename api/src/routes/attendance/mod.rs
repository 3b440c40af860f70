use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

mod common;
mod delete;
mod get;
mod post;
mod put;

pub use delete::delete_record;
pub use get::{course_records, list_records, overview, schedule_records, statistics, tap_status};
pub use post::{generate_session, manual_attendance, scan_session, tap_in, tap_out};
pub use put::update_record;

use crate::auth::guards::{
    require_campus_tap, require_issue_session, require_manual_override, require_scan_session,
    require_view_others,
};

/// Builds the `/attendance` route group. Expects an authenticated caller.
pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/qr/generate", post(generate_session).route_layer(from_fn(require_issue_session)))
        .route("/qr/scan", post(scan_session).route_layer(from_fn(require_scan_session)))
        .route("/tap-in", post(tap_in).route_layer(from_fn(require_campus_tap)))
        .route("/tap-out", post(tap_out).route_layer(from_fn(require_campus_tap)))
        .route("/tap-status", get(tap_status))
        .route("/manual", post(manual_attendance).route_layer(from_fn(require_manual_override)))
        .route("/records", get(list_records))
        .route(
            "/records/{record_id}",
            put(update_record)
                .delete(delete_record)
                .route_layer(from_fn(require_manual_override)),
        )
        .route("/statistics", get(statistics))
        .route("/overview", get(overview))
        .route(
            "/by-course/{course_id}",
            get(course_records).route_layer(from_fn(require_view_others)),
        )
        .route(
            "/schedules/{schedule_id}/records",
            get(schedule_records).route_layer(from_fn(require_view_others)),
        )
}
