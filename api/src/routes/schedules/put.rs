use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use db::models::class_schedule::ClassScheduleChanges;
use serde::Deserialize;
use services::schedule_catalog::ScheduleCatalog;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error, validation_failed};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateScheduleReq {
    #[validate(length(max = 50, message = "room must be at most 50 characters"))]
    pub room: Option<String>,
    /// Turns the schedule into a one-off meeting.
    pub date: Option<NaiveDate>,
    /// Turns the schedule into a weekly meeting.
    pub day_of_week: Option<i32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

/// PUT /api/schedules/{schedule_id}
///
/// Partial update by a schedule manager or the lecturer teaching the class.
/// Setting `is_active` to `false` also retires the class's QR sessions.
///
/// ### Responses
/// - `200 OK` with the updated schedule
/// - `403 Forbidden` for a lecturer who does not teach it
/// - `404 Not Found` for an unknown or deleted schedule
/// - `422 Unprocessable Entity` when the result would not be a valid schedule
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<i64>,
    Json(body): Json<UpdateScheduleReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    let changes = ClassScheduleChanges {
        room: body.room,
        date: body.date,
        day_of_week: body.day_of_week,
        start_time: body.start_time,
        end_time: body.end_time,
        is_active: body.is_active,
    };

    match ScheduleCatalog::update_schedule(
        state.db(),
        &user.actor(),
        schedule_id,
        changes,
        Utc::now(),
    )
    .await
    {
        Ok(schedule) => (
            StatusCode::OK,
            Json(ApiResponse::success(schedule, "Class schedule updated")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
