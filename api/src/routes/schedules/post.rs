use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveTime};
use db::models::class_schedule::NewClassSchedule;
use serde::Deserialize;
use services::schedule_catalog::ScheduleCatalog;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error, validation_failed};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleReq {
    pub course_id: i64,
    pub lecturer_id: i64,
    #[validate(length(max = 50, message = "room must be at most 50 characters"))]
    pub room: Option<String>,
    /// One-off meeting date. Mutually exclusive with `day_of_week`.
    pub date: Option<NaiveDate>,
    /// Weekly meeting day, 1 = Monday .. 7 = Sunday.
    pub day_of_week: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// POST /api/schedules
///
/// ### Request Body
/// ```json
/// { "course_id": 3, "lecturer_id": 10, "room": "IT 4-1", "day_of_week": 1,
///   "start_time": "09:30:00", "end_time": "10:20:00" }
/// ```
///
/// ### Responses
/// - `201 Created` with the schedule
/// - `422 Unprocessable Entity` unless exactly one of `date` and `day_of_week` is set
pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateScheduleReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    let new = NewClassSchedule {
        course_id: body.course_id,
        lecturer_id: body.lecturer_id,
        room: body.room,
        date: body.date,
        day_of_week: body.day_of_week,
        start_time: body.start_time,
        end_time: body.end_time,
    };

    match ScheduleCatalog::create_schedule(state.db(), &user.actor(), new).await {
        Ok(schedule) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(schedule, "Class schedule created")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
