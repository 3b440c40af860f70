use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

mod delete;
mod get;
mod post;
mod put;

pub use delete::delete_schedule;
pub use get::{get_schedule, list_schedules, today_schedules};
pub use post::create_schedule;
pub use put::update_schedule;

use crate::auth::guards::{require_issue_session, require_manage_schedules};

/// Builds the `/schedules` route group. Expects an authenticated caller.
pub fn schedules_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules))
        .route("/", post(create_schedule).route_layer(from_fn(require_manage_schedules)))
        .route("/today", get(today_schedules))
        .route("/{schedule_id}", get(get_schedule))
        .route(
            "/{schedule_id}",
            put(update_schedule)
                .delete(delete_schedule)
                .route_layer(from_fn(require_issue_session)),
        )
}
