use chrono::NaiveDate;
use db::models::attendance_record::{self, AttendanceStatus};
use db::models::class_schedule;
use serde::{Deserialize, Serialize};
use services::attendance_ledger::AttendanceStats;
use services::presence_engine::AttendanceOverview;
use services::schedule_catalog::UpcomingMeeting;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct AttendanceRecordResponse {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub kind: String,
    pub status: String,
    pub context: String,
    pub schedule_id: Option<i64>,
    pub session_id: Option<i64>,
    pub geofence_id: Option<i64>,
    pub check_in_at: String,
    pub check_out_at: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub checkout_latitude: Option<f64>,
    pub checkout_longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<attendance_record::Model> for AttendanceRecordResponse {
    fn from(m: attendance_record::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            date: m.date.to_string(),
            kind: m.kind.to_string(),
            status: m.status.to_string(),
            context: m.context_key,
            schedule_id: m.schedule_id,
            session_id: m.session_id,
            geofence_id: m.geofence_id,
            check_in_at: m.check_in_at.to_rfc3339(),
            check_out_at: m.check_out_at.map(|t| t.to_rfc3339()),
            latitude: m.latitude,
            longitude: m.longitude,
            checkout_latitude: m.checkout_latitude,
            checkout_longitude: m.checkout_longitude,
            notes: m.notes,
            created_by: m.created_by,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TapStatusResponse {
    pub tapped_in: bool,
    pub record: Option<AttendanceRecordResponse>,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub date: String,
    pub today: Vec<class_schedule::Model>,
    pub upcoming: Vec<UpcomingMeeting>,
    pub open_tap: Option<AttendanceRecordResponse>,
    pub statistics: AttendanceStats,
}

impl From<AttendanceOverview> for OverviewResponse {
    fn from(o: AttendanceOverview) -> Self {
        Self {
            date: o.date.to_string(),
            today: o.today,
            upcoming: o.upcoming,
            open_tap: o.open_tap.map(AttendanceRecordResponse::from),
            statistics: o.statistics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub records: Vec<AttendanceRecordResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateSessionReq {
    pub schedule_id: i64,
    /// Lifetime in seconds; the configured default when absent.
    #[validate(range(min = 1, message = "ttl_seconds must be positive"))]
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScanSessionReq {
    #[validate(length(min = 1, message = "session_token is required"))]
    pub session_token: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ManualAttendanceReq {
    pub user_id: i64,
    pub date: NaiveDate,
    pub schedule_id: Option<i64>,
    #[validate(length(max = 100, message = "label must be at most 100 characters"))]
    pub label: Option<String>,
    pub status: AttendanceStatus,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAttendanceReq {
    pub status: Option<AttendanceStatus>,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
}
