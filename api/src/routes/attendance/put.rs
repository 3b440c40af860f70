use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use util::state::AppState;
use validator::Validate;

use super::common::{AttendanceRecordResponse, UpdateAttendanceReq};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error, validation_failed};
use crate::routes::common::engine;

/// PUT /api/attendance/records/{record_id}
///
/// Changes the status and/or notes of a live record.
pub async fn update_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(record_id): Path<i64>,
    Json(body): Json<UpdateAttendanceReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    match engine()
        .amend_attendance(state.db(), &user.actor(), record_id, body.status, body.notes)
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Attendance record updated",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
