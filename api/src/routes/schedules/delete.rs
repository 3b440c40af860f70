use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::schedule_catalog::ScheduleCatalog;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};

/// DELETE /api/schedules/{schedule_id}
///
/// Soft-deletes the schedule. Attendance already recorded against it stays.
pub async fn delete_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<i64>,
) -> Response {
    match ScheduleCatalog::delete_schedule(state.db(), &user.actor(), schedule_id, Utc::now()).await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Class schedule deleted")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
