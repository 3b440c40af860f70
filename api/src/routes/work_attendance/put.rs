use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::shift_pattern::ShiftPatternChanges;
use services::shift_admin::ShiftAdmin;
use util::state::AppState;
use validator::Validate;

use super::common::UpdateShiftPatternReq;
use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error, validation_failed};

/// PUT /api/work-attendance/shift-patterns/{pattern_id}
///
/// Partial update; absent fields keep their value.
pub async fn update_shift_pattern(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(pattern_id): Path<i64>,
    Json(body): Json<UpdateShiftPatternReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    let changes = ShiftPatternChanges {
        name: body.name,
        start_time: body.start_time,
        end_time: body.end_time,
        grace_minutes: body.grace_minutes,
        is_active: body.is_active,
    };

    match ShiftAdmin::update_shift_pattern(state.db(), &user.actor(), pattern_id, changes).await {
        Ok(pattern) => (
            StatusCode::OK,
            Json(ApiResponse::success(pattern, "Shift pattern updated")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
