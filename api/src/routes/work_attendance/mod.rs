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

pub use delete::delete_shift_pattern;
pub use get::{
    get_shift_pattern, list_shift_patterns, list_user_shifts, list_work_records,
    list_work_schedules,
};
pub use post::{check_in, check_out, create_shift_pattern, create_user_shift, create_work_schedule};
pub use put::update_shift_pattern;

use crate::auth::guards::{require_manage_shifts, require_work_check};

/// Builds the `/work-attendance` route group. Expects an authenticated caller.
pub fn work_attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(check_in).route_layer(from_fn(require_work_check)))
        .route("/check-out", post(check_out).route_layer(from_fn(require_work_check)))
        .route("/records", get(list_work_records))
        .route("/schedules", get(list_work_schedules))
        .route(
            "/schedules",
            post(create_work_schedule).route_layer(from_fn(require_manage_shifts)),
        )
        .route("/shift-patterns", get(list_shift_patterns))
        .route(
            "/shift-patterns",
            post(create_shift_pattern).route_layer(from_fn(require_manage_shifts)),
        )
        .route("/shift-patterns/{pattern_id}", get(get_shift_pattern))
        .route(
            "/shift-patterns/{pattern_id}",
            put(update_shift_pattern)
                .delete(delete_shift_pattern)
                .route_layer(from_fn(require_manage_shifts)),
        )
        .route("/user-shifts", get(list_user_shifts))
        .route(
            "/user-shifts",
            post(create_user_shift).route_layer(from_fn(require_manage_shifts)),
        )
}
