use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};
use crate::routes::common::engine;

/// DELETE /api/attendance/records/{record_id}
///
/// Soft-deletes a record. The person may be recorded again for the same
/// context and day afterwards.
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<i64>,
) -> Response {
    match engine()
        .delete_attendance(state.db(), &user.actor(), record_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Attendance record deleted")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
