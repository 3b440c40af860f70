use chrono::{NaiveDate, NaiveTime};
use db::models::work_attendance_record;
use serde::{Deserialize, Serialize};
use services::capability::Capability;
use services::error::PresenceError;
use validator::Validate;

use crate::auth::AuthUser;

/// The user a listing is about: the caller unless `requested` names someone
/// else, which needs `view_others`.
pub fn target_user(user: &AuthUser, requested: Option<i64>) -> Result<i64, PresenceError> {
    match requested {
        Some(id) if id != user.0.sub => {
            user.actor().require(Capability::ViewOthers)?;
            Ok(id)
        }
        _ => Ok(user.0.sub),
    }
}

#[derive(Debug, Serialize)]
pub struct WorkRecordResponse {
    pub id: i64,
    pub user_id: i64,
    pub work_schedule_id: i64,
    pub date: String,
    pub kind: String,
    pub status: String,
    pub minutes_offset: i32,
    pub recorded_at: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_id: Option<i64>,
}

impl From<work_attendance_record::Model> for WorkRecordResponse {
    fn from(m: work_attendance_record::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            work_schedule_id: m.work_schedule_id,
            date: m.date.to_string(),
            kind: m.kind.to_string(),
            status: m.status.to_string(),
            minutes_offset: m.minutes_offset,
            recorded_at: m.recorded_at.to_rfc3339(),
            latitude: m.latitude,
            longitude: m.longitude,
            geofence_id: m.geofence_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkCheckReq {
    pub work_schedule_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShiftPatternReq {
    #[validate(length(min = 1, max = 20, message = "code must be 1-20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grace_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateShiftPatternReq {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub grace_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PatternListQuery {
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserShiftReq {
    pub user_id: i64,
    pub shift_pattern_id: i64,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UserShiftQuery {
    pub user_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkScheduleReq {
    pub user_id: i64,
    pub date: NaiveDate,
    pub shift_pattern_id: Option<i64>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub grace_minutes: Option<i32>,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}
