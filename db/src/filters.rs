use chrono::NaiveDate;

use crate::models::attendance_record::AttendanceStatus;

/// Narrowing applied to attendance record listings and statistics.
/// Soft-deleted rows are always excluded.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub user_id: Option<i64>,
    pub schedule_id: Option<i64>,
    /// Any of these schedules. An empty set matches nothing.
    pub schedule_ids: Option<Vec<i64>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_schedule_id(mut self, schedule_id: i64) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }

    pub fn with_schedule_ids(mut self, schedule_ids: Vec<i64>) -> Self {
        self.schedule_ids = Some(schedule_ids);
        self
    }

    /// Inclusive date range. Either end may be open.
    pub fn with_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_status(mut self, status: AttendanceStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Narrowing for work schedule and work attendance listings.
#[derive(Debug, Clone, Default)]
pub struct WorkFilter {
    pub user_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl WorkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }
}
