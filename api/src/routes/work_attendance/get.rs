use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::shift_admin::ShiftAdmin;
use util::state::AppState;

use super::common::{PatternListQuery, UserShiftQuery, WorkRecordResponse, target_user};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};
use crate::routes::common::RangeQuery;

/// GET /api/work-attendance/records?user_id=&start_date=&end_date=
pub async fn list_work_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let user_id = match target_user(&user, query.user_id) {
        Ok(id) => id,
        Err(e) => return from_presence_error(e).into_response(),
    };

    match ShiftAdmin::work_records_for(state.db(), user_id, query.start_date, query.end_date).await
    {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records
                    .into_iter()
                    .map(WorkRecordResponse::from)
                    .collect::<Vec<_>>(),
                "Work attendance retrieved",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/work-attendance/schedules?user_id=&start_date=&end_date=
pub async fn list_work_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let user_id = match target_user(&user, query.user_id) {
        Ok(id) => id,
        Err(e) => return from_presence_error(e).into_response(),
    };

    match ShiftAdmin::work_schedules_for(state.db(), user_id, query.start_date, query.end_date)
        .await
    {
        Ok(schedules) => (
            StatusCode::OK,
            Json(ApiResponse::success(schedules, "Work schedules retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/work-attendance/shift-patterns?active_only=true
pub async fn list_shift_patterns(
    State(state): State<AppState>,
    Query(query): Query<PatternListQuery>,
) -> Response {
    match ShiftAdmin::list_shift_patterns(state.db(), query.active_only.unwrap_or(false)).await {
        Ok(patterns) => (
            StatusCode::OK,
            Json(ApiResponse::success(patterns, "Shift patterns retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/work-attendance/shift-patterns/{pattern_id}
pub async fn get_shift_pattern(
    State(state): State<AppState>,
    Path(pattern_id): Path<i64>,
) -> Response {
    match ShiftAdmin::shift_pattern_by_id(state.db(), pattern_id).await {
        Ok(pattern) => (
            StatusCode::OK,
            Json(ApiResponse::success(pattern, "Shift pattern retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/work-attendance/user-shifts?user_id=&date=
///
/// Active assignments, latest first. With `date`, only those covering it.
pub async fn list_user_shifts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<UserShiftQuery>,
) -> Response {
    let user_id = match target_user(&user, query.user_id) {
        Ok(id) => id,
        Err(e) => return from_presence_error(e).into_response(),
    };

    match ShiftAdmin::user_shifts_for(state.db(), user_id, query.date).await {
        Ok(shifts) => (
            StatusCode::OK,
            Json(ApiResponse::success(shifts, "Shift assignments retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
