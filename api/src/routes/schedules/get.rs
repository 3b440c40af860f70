use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use services::schedule_catalog::ScheduleCatalog;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};
use crate::routes::common::engine;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Defaults to the caller.
    pub lecturer_id: Option<i64>,
    /// Defaults to today on the campus clock.
    pub date: Option<NaiveDate>,
}

/// GET /api/schedules/{schedule_id}
pub async fn get_schedule(State(state): State<AppState>, Path(schedule_id): Path<i64>) -> Response {
    match ScheduleCatalog::schedule_by_id(state.db(), schedule_id).await {
        Ok(schedule) => (
            StatusCode::OK,
            Json(ApiResponse::success(schedule, "Class schedule retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/schedules/today
///
/// The caller's classes meeting today, by start time.
pub async fn today_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let today = engine().policy().local_date(Utc::now());
    lecturer_schedules(&state, user.0.sub, today).await
}

/// GET /api/schedules?lecturer_id=&date=
pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Response {
    let date = query
        .date
        .unwrap_or_else(|| engine().policy().local_date(Utc::now()));
    lecturer_schedules(&state, query.lecturer_id.unwrap_or(user.0.sub), date).await
}

async fn lecturer_schedules(state: &AppState, lecturer_id: i64, date: NaiveDate) -> Response {
    match ScheduleCatalog::schedules_for_lecturer(state.db(), lecturer_id, date).await {
        Ok(schedules) => (
            StatusCode::OK,
            Json(ApiResponse::success(schedules, "Class schedules retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
