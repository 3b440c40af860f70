use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use services::attendance_ledger::AttendanceLedger;
use util::state::AppState;

use super::common::{
    AttendanceRecordResponse, ListQuery, ListResponse, OverviewResponse, TapStatusResponse,
};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};
use crate::routes::common::{RangeQuery, engine};

/// GET /api/attendance/tap-status
///
/// Whether the caller has an open tap-in today, with the open record if so.
pub async fn tap_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let today = engine().policy().local_date(Utc::now());

    match AttendanceLedger::tap_status(state.db(), user.0.sub, today).await {
        Ok(status) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                TapStatusResponse {
                    tapped_in: status.tapped_in,
                    record: status.record.map(AttendanceRecordResponse::from),
                },
                "Tap status retrieved",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/attendance/records
///
/// Live records of `user_id` (the caller by default), newest first.
///
/// ### Query Parameters
/// - `user_id` (optional): someone else's records, needs `view_others`
/// - `start_date`, `end_date` (optional): inclusive `YYYY-MM-DD` bounds
/// - `page` (default 1), `per_page` (default 20, max 100)
pub async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Response {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(20);
    let user_id = query.user_id.unwrap_or(user.0.sub);

    match engine()
        .list_records(
            state.db(),
            &user.actor(),
            user_id,
            query.start_date,
            query.end_date,
            page,
            per_page,
        )
        .await
    {
        Ok((records, total)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ListResponse {
                    records: records.into_iter().map(AttendanceRecordResponse::from).collect(),
                    page,
                    per_page,
                    total,
                },
                "Attendance records retrieved",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/attendance/statistics
///
/// Totals per status and per type plus the share of `present` records.
/// An empty range yields zero totals and a rate of `0.0`.
pub async fn statistics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let user_id = query.user_id.unwrap_or(user.0.sub);

    match engine()
        .statistics(
            state.db(),
            &user.actor(),
            user_id,
            query.start_date,
            query.end_date,
        )
        .await
    {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(stats, "Attendance statistics retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/attendance/schedules/{schedule_id}/records
pub async fn schedule_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<i64>,
) -> Response {
    match engine()
        .schedule_records(state.db(), &user.actor(), schedule_id)
        .await
    {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records
                    .into_iter()
                    .map(AttendanceRecordResponse::from)
                    .collect::<Vec<_>>(),
                "Schedule attendance retrieved",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/attendance/overview
///
/// The caller's day: classes meeting today, the next meetings within a week,
/// the open campus tap and all-time statistics.
pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match engine().overview(state.db(), &user.actor(), Utc::now()).await {
        Ok(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                OverviewResponse::from(overview),
                "Attendance overview retrieved",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// GET /api/attendance/by-course/{course_id}?start_date=&end_date=
///
/// Live records of every schedule of the course, newest first.
pub async fn course_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> Response {
    match engine()
        .course_records(
            state.db(),
            &user.actor(),
            course_id,
            query.start_date,
            query.end_date,
        )
        .await
    {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records
                    .into_iter()
                    .map(AttendanceRecordResponse::from)
                    .collect::<Vec<_>>(),
                "Course attendance retrieved",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
