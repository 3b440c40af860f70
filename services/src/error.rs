use chrono::{DateTime, FixedOffset};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Coarse classification every [`PresenceError`] falls into. Transports map
/// this to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Invalid,
    Forbidden,
    Internal,
}

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("class schedule {0} not found")]
    ScheduleNotFound(i64),

    #[error("work schedule {0} not found")]
    WorkScheduleNotFound(i64),

    #[error("shift pattern {0} not found")]
    ShiftPatternNotFound(i64),

    #[error("attendance record {0} not found")]
    AttendanceNotFound(i64),

    #[error("geofence {0} not found")]
    GeofenceNotFound(i64),

    #[error("no active attendance session for schedule {0}")]
    NoActiveSession(i64),

    #[error("class schedule {0} is inactive")]
    ScheduleInactive(i64),

    #[error("attendance session rejected: {reason}")]
    SessionExpiredOrInvalid { reason: String },

    #[error("location ({latitude}, {longitude}) is outside every geofence (checked: {})", format_checked(.checked))]
    OutsideGeofence {
        latitude: f64,
        longitude: f64,
        checked: Vec<String>,
    },

    #[error("attendance already recorded for {context} on {date}")]
    DuplicateAttendance { context: String, date: String },

    #[error("already tapped in today")]
    AlreadyTappedIn,

    #[error("no open tap-in to close today")]
    NoOpenTapIn,

    #[error("outside schedule window (opens {opens}, closes {closes})")]
    OutsideScheduleWindow {
        opens: DateTime<FixedOffset>,
        closes: DateTime<FixedOffset>,
    },

    #[error("outside shift window (opens {opens}, closes {closes})")]
    OutsideShiftWindow {
        opens: DateTime<FixedOffset>,
        closes: DateTime<FixedOffset>,
    },

    #[error("already checked in for work schedule {0}")]
    AlreadyCheckedIn(i64),

    #[error("already checked out for work schedule {0}")]
    AlreadyCheckedOut(i64),

    #[error("no check-in recorded for work schedule {0}")]
    NoOpenCheckIn(i64),

    #[error("shift pattern code {0} is already in use")]
    DuplicateShiftCode(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("concurrent session change for schedule {0}, retry")]
    ConcurrentSessionIssue(i64),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

fn format_checked(checked: &[String]) -> String {
    if checked.is_empty() {
        "none configured".to_string()
    } else {
        checked.join(", ")
    }
}

impl PresenceError {
    pub fn kind(&self) -> ErrorKind {
        use PresenceError::*;
        match self {
            ScheduleNotFound(_)
            | WorkScheduleNotFound(_)
            | ShiftPatternNotFound(_)
            | AttendanceNotFound(_)
            | GeofenceNotFound(_)
            | NoActiveSession(_) => ErrorKind::NotFound,

            DuplicateAttendance { .. }
            | AlreadyTappedIn
            | AlreadyCheckedIn(_)
            | AlreadyCheckedOut(_)
            | DuplicateShiftCode(_)
            | ConcurrentSessionIssue(_) => ErrorKind::Conflict,

            ScheduleInactive(_)
            | SessionExpiredOrInvalid { .. }
            | OutsideGeofence { .. }
            | NoOpenTapIn
            | OutsideScheduleWindow { .. }
            | OutsideShiftWindow { .. }
            | NoOpenCheckIn(_)
            | Validation(_) => ErrorKind::Invalid,

            Forbidden(_) => ErrorKind::Forbidden,

            Database(_) => ErrorKind::Internal,
        }
    }
}

/// True when `err` is the store rejecting a row over a unique index.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
