use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::shift_admin::ShiftAdmin;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};

/// DELETE /api/work-attendance/shift-patterns/{pattern_id}
///
/// Soft delete. The pattern's code becomes available again.
pub async fn delete_shift_pattern(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(pattern_id): Path<i64>,
) -> Response {
    match ShiftAdmin::delete_shift_pattern(state.db(), &user.actor(), pattern_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Shift pattern deleted")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
