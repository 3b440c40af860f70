use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::shift_admin::{NewShiftPattern, ShiftAdmin, WorkScheduleRequest};
use util::state::AppState;
use validator::Validate;

use super::common::{
    CreateShiftPatternReq, CreateUserShiftReq, CreateWorkScheduleReq, WorkCheckReq,
    WorkRecordResponse,
};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, Empty, from_presence_error, validation_failed};
use crate::routes::common::{engine, optional_location};

fn unpaired_location(msg: String) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::<Empty>::error(msg)),
    )
        .into_response()
}

/// POST /api/work-attendance/check-in
///
/// ### Request Body
/// ```json
/// { "work_schedule_id": 4, "latitude": -25.7545, "longitude": 28.2314 }
/// ```
///
/// ### Responses
/// - `201 Created` with `status` `on_time` or `late` and the minutes late
/// - `409 Conflict` when already checked in
/// - `422 Unprocessable Entity` outside the shift window or every geofence
pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<WorkCheckReq>,
) -> Response {
    let location = match optional_location(body.latitude, body.longitude) {
        Ok(l) => l,
        Err(msg) => return unpaired_location(msg),
    };

    match engine()
        .check_in(state.db(), &user.actor(), body.work_schedule_id, location, Utc::now())
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                WorkRecordResponse::from(record),
                "Checked in",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/work-attendance/check-out
///
/// ### Responses
/// - `201 Created` with `status` `on_time` or `early_leave`
/// - `409 Conflict` when already checked out
/// - `422 Unprocessable Entity` without a prior check-in
pub async fn check_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<WorkCheckReq>,
) -> Response {
    let location = match optional_location(body.latitude, body.longitude) {
        Ok(l) => l,
        Err(msg) => return unpaired_location(msg),
    };

    match engine()
        .check_out(state.db(), &user.actor(), body.work_schedule_id, location, Utc::now())
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                WorkRecordResponse::from(record),
                "Checked out",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/work-attendance/shift-patterns
///
/// Codes are stored upper-case and must be unique among live patterns.
pub async fn create_shift_pattern(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateShiftPatternReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    let new = NewShiftPattern {
        code: body.code,
        name: body.name,
        start_time: body.start_time,
        end_time: body.end_time,
        grace_minutes: body.grace_minutes.unwrap_or(0),
    };

    match ShiftAdmin::create_shift_pattern(state.db(), &user.actor(), new).await {
        Ok(pattern) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(pattern, "Shift pattern created")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/work-attendance/user-shifts
pub async fn create_user_shift(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateUserShiftReq>,
) -> Response {
    match ShiftAdmin::create_user_shift(
        state.db(),
        &user.actor(),
        body.user_id,
        body.shift_pattern_id,
        body.effective_from,
        body.effective_until,
    )
    .await
    {
        Ok(assignment) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(assignment, "Shift assigned")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/work-attendance/schedules
///
/// Times left out are taken from `shift_pattern_id`, or from the user's shift
/// assignment effective on `date`.
pub async fn create_work_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateWorkScheduleReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    let req = WorkScheduleRequest {
        user_id: body.user_id,
        date: body.date,
        shift_pattern_id: body.shift_pattern_id,
        start_time: body.start_time,
        end_time: body.end_time,
        grace_minutes: body.grace_minutes,
        notes: body.notes,
    };

    match ShiftAdmin::create_work_schedule(state.db(), &user.actor(), req).await {
        Ok(schedule) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(schedule, "Work schedule created")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
