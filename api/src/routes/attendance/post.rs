use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use services::error::PresenceError;
use services::presence_engine::ManualEntry;
use util::state::AppState;
use validator::Validate;

use super::common::{
    AttendanceRecordResponse, GenerateSessionReq, ManualAttendanceReq, ScanSessionReq,
};
use crate::auth::AuthUser;
use crate::response::{ApiResponse, Empty, from_presence_error, validation_failed};
use crate::routes::common::{LocationReq, engine, optional_location};

/// POST /api/attendance/qr/generate
///
/// Opens a new QR session for a class schedule, superseding the active one.
///
/// ### Request Body
/// ```json
/// { "schedule_id": 12, "ttl_seconds": 300 }
/// ```
///
/// ### Responses
/// - `201 Created` with `{ session_id, schedule_id, session_token, expires_at }`
/// - `403 Forbidden` when the schedule is taught by someone else
/// - `404 Not Found` for an unknown schedule
/// - `422 Unprocessable Entity` for an inactive schedule or an out-of-range ttl
pub async fn generate_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GenerateSessionReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }
    let ttl = match body.ttl_seconds {
        Some(secs) => match Duration::try_seconds(secs) {
            Some(ttl) => Some(ttl),
            None => {
                let err = PresenceError::Validation(format!("ttl_seconds {secs} is out of range"));
                return from_presence_error(err).into_response();
            }
        },
        None => None,
    };

    match engine()
        .generate_session(state.db(), &user.actor(), body.schedule_id, ttl, Utc::now())
        .await
    {
        Ok(issued) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(issued, "Attendance session issued")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/attendance/qr/scan
///
/// Records the caller's class attendance from a scanned session token.
/// Coordinates are optional and stored with the record when sent.
///
/// ### Responses
/// - `201 Created` with the record (`status` is `present` or `late`)
/// - `409 Conflict` when already recorded for that class and day
/// - `422 Unprocessable Entity` for an expired or superseded token, or a scan
///   outside the class window
pub async fn scan_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ScanSessionReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }
    let location = match optional_location(body.latitude, body.longitude) {
        Ok(l) => l,
        Err(msg) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::<Empty>::error(msg)),
            )
                .into_response();
        }
    };

    match engine()
        .scan_session(state.db(), &user.actor(), &body.session_token, location, Utc::now())
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Attendance recorded",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/attendance/tap-in
///
/// Opens the caller's campus presence for today.
///
/// ### Request Body
/// ```json
/// { "latitude": -25.7545, "longitude": 28.2314 }
/// ```
///
/// ### Responses
/// - `201 Created` with the open record
/// - `409 Conflict` when a tap-in is already open today
/// - `422 Unprocessable Entity` when outside every geofence
pub async fn tap_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LocationReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    match engine()
        .tap_in(state.db(), &user.actor(), body.into(), Utc::now())
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Tapped in",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/attendance/tap-out
///
/// Closes today's open tap-in.
///
/// ### Responses
/// - `200 OK` with the closed record
/// - `422 Unprocessable Entity` when nothing is open or outside every geofence
pub async fn tap_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LocationReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    match engine()
        .tap_out(state.db(), &user.actor(), body.into(), Utc::now())
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Tapped out",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}

/// POST /api/attendance/manual
///
/// Records attendance on behalf of someone else. Either `schedule_id` or a
/// non-empty `label` names the context.
///
/// ### Request Body
/// ```json
/// { "user_id": 7, "date": "2025-10-06", "schedule_id": 12, "status": "excused", "notes": "medical" }
/// ```
pub async fn manual_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ManualAttendanceReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    let entry = ManualEntry {
        user_id: body.user_id,
        date: body.date,
        schedule_id: body.schedule_id,
        label: body.label,
        status: body.status,
        notes: body.notes,
    };

    match engine()
        .manual_attendance(state.db(), &user.actor(), entry, Utc::now())
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                AttendanceRecordResponse::from(record),
                "Attendance recorded",
            )),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
