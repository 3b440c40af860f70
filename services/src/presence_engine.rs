//! The three verification flows: QR sessions, campus taps and work shifts.
//!
//! Each public method is one decision. Guards run in a fixed order
//! (capability, referenced rows, time window, location, duplicates) and the
//! first failing guard is returned as is.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use db::filters::AttendanceFilter;
use db::models::attendance_record::{self, AttendanceKind, AttendanceStatus};
use db::models::class_schedule;
use db::models::work_attendance_record::{self, NewWorkAttendance, WorkStatus};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;

use crate::attendance_ledger::{AttendanceContext, AttendanceFact, AttendanceLedger, AttendanceStats};
use crate::capability::{Actor, Capability};
use crate::error::PresenceError;
use crate::geo::Coordinates;
use crate::policy::PresencePolicy;
use crate::schedule_catalog::{ScheduleCatalog, UpcomingMeeting};
use crate::session_registry::SessionRegistry;

/// How long before the shift start a check-in is accepted.
pub const EARLY_CHECK_IN_MINUTES: i64 = 60;
/// How long after the shift end a check-out is still accepted.
pub const LATE_CHECK_OUT_MINUTES: i64 = 6 * 60;

#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub session_id: i64,
    pub schedule_id: i64,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

/// A privileged attendance entry.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub user_id: i64,
    pub date: NaiveDate,
    pub schedule_id: Option<i64>,
    /// Context label, required when no schedule is given.
    pub label: Option<String>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Dashboard view of one actor's day.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceOverview {
    pub date: NaiveDate,
    /// Active schedules meeting today. Lecturers see the classes they teach.
    pub today: Vec<class_schedule::Model>,
    pub upcoming: Vec<UpcomingMeeting>,
    pub open_tap: Option<attendance_record::Model>,
    pub statistics: AttendanceStats,
}

/// Days ahead scanned for upcoming meetings.
pub const UPCOMING_DAYS: u64 = 7;
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct PresenceEngine {
    policy: PresencePolicy,
}

/// Largest page accepted by record listings.
pub const MAX_PER_PAGE: u64 = 100;
pub const MAX_PAGE: u64 = 10_000;

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), PresenceError> {
    match (from, to) {
        (Some(f), Some(t)) if f > t => Err(PresenceError::Validation(format!(
            "start_date {f} is after end_date {t}"
        ))),
        _ => Ok(()),
    }
}

fn rejected(flow: &'static str, actor: &Actor, err: &PresenceError) {
    tracing::warn!(flow, actor_id = actor.id, role = %actor.role, error = %err, "verification rejected");
}

impl PresenceEngine {
    pub fn new(policy: PresencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PresencePolicy {
        &self.policy
    }

    /// Issues a fresh QR session for a class schedule.
    ///
    /// Lecturers may only issue for schedules they teach; roles holding
    /// `IssueAnySession` may issue for any.
    pub async fn generate_session<C>(
        &self,
        db: &C,
        actor: &Actor,
        schedule_id: i64,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, PresenceError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let result = async {
            actor.require(Capability::IssueSession)?;

            let ttl = ttl.unwrap_or(self.policy.default_session_ttl);
            if ttl <= Duration::zero() || ttl > self.policy.max_session_ttl {
                return Err(PresenceError::Validation(format!(
                    "session ttl must be between 1 and {} seconds",
                    self.policy.max_session_ttl.num_seconds()
                )));
            }

            let schedule = ScheduleCatalog::schedule_by_id(db, schedule_id).await?;
            if schedule.lecturer_id != actor.id && !actor.can(Capability::IssueAnySession) {
                return Err(PresenceError::Forbidden(format!(
                    "class schedule {schedule_id} is not taught by user {}",
                    actor.id
                )));
            }

            let session = SessionRegistry::open_session(db, schedule_id, actor.id, ttl, now).await?;
            Ok(IssuedSession {
                session_id: session.id,
                schedule_id,
                session_token: session.token,
                expires_at: session.expires_at,
            })
        }
        .await;

        result.inspect_err(|e| rejected("qr_generate", actor, e))
    }

    /// Records class attendance from a scanned session token.
    pub async fn scan_session<C>(
        &self,
        db: &C,
        actor: &Actor,
        token: &str,
        location: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let result = async {
            actor.require(Capability::ScanSession)?;
            if let Some(p) = location {
                p.validate()?;
            }

            let session = SessionRegistry::resolve_by_token(db, token, now).await?;
            let schedule = ScheduleCatalog::schedule_by_id(db, session.schedule_id).await?;
            if !schedule.is_active {
                return Err(PresenceError::ScheduleInactive(schedule.id));
            }
            let (date, status) = ScheduleCatalog::admit(&schedule, now, &self.policy)?;

            AttendanceLedger::record_attendance(
                db,
                AttendanceFact {
                    actor_id: actor.id,
                    date,
                    context: AttendanceContext::Schedule(schedule.id),
                    kind: AttendanceKind::Qr,
                    status,
                    at: now,
                    session_id: Some(session.id),
                    location,
                    notes: None,
                    created_by: None,
                },
            )
            .await
        }
        .await;

        match &result {
            Ok(rec) => tracing::info!(
                actor_id = actor.id,
                schedule_id = rec.schedule_id,
                status = %rec.status,
                "qr attendance recorded"
            ),
            Err(e) => rejected("qr_scan", actor, e),
        }
        result
    }

    pub async fn tap_in<C>(
        &self,
        db: &C,
        actor: &Actor,
        at_point: Coordinates,
        now: DateTime<Utc>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let result = async {
            actor.require(Capability::CampusTap)?;
            let date = self.policy.local_date(now);
            AttendanceLedger::open_tap_in(db, actor.id, at_point, date, now).await
        }
        .await;

        match &result {
            Ok(rec) => tracing::info!(actor_id = actor.id, geofence_id = ?rec.geofence_id, "tapped in"),
            Err(e) => rejected("tap_in", actor, e),
        }
        result
    }

    pub async fn tap_out<C>(
        &self,
        db: &C,
        actor: &Actor,
        at_point: Coordinates,
        now: DateTime<Utc>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let result = async {
            actor.require(Capability::CampusTap)?;
            let date = self.policy.local_date(now);
            AttendanceLedger::close_tap_out(db, actor.id, at_point, date, now).await
        }
        .await;

        match &result {
            Ok(rec) => tracing::info!(actor_id = actor.id, record_id = rec.id, "tapped out"),
            Err(e) => rejected("tap_out", actor, e),
        }
        result
    }

    /// Privileged entry of an attendance fact on someone's behalf.
    pub async fn manual_attendance<C>(
        &self,
        db: &C,
        actor: &Actor,
        entry: ManualEntry,
        now: DateTime<Utc>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let result = async {
            actor.require(Capability::ManualOverride)?;

            let context = match (entry.schedule_id, entry.label.as_deref().map(str::trim)) {
                (Some(schedule_id), _) => {
                    let schedule = ScheduleCatalog::schedule_by_id(db, schedule_id).await?;
                    if schedule.lecturer_id != actor.id && !actor.can(Capability::IssueAnySession)
                    {
                        return Err(PresenceError::Forbidden(format!(
                            "class schedule {schedule_id} is not taught by user {}",
                            actor.id
                        )));
                    }
                    AttendanceContext::Schedule(schedule_id)
                }
                (None, Some(label)) if !label.is_empty() => {
                    AttendanceContext::Label(label.to_string())
                }
                _ => {
                    return Err(PresenceError::Validation(
                        "either schedule_id or a non-empty label is required".into(),
                    ));
                }
            };

            AttendanceLedger::record_attendance(
                db,
                AttendanceFact {
                    actor_id: entry.user_id,
                    date: entry.date,
                    context,
                    kind: AttendanceKind::Manual,
                    status: entry.status,
                    at: now,
                    session_id: None,
                    location: None,
                    notes: entry.notes,
                    created_by: Some(actor.id),
                },
            )
            .await
        }
        .await;

        match &result {
            Ok(rec) => tracing::info!(
                actor_id = actor.id,
                user_id = rec.user_id,
                context = %rec.context_key,
                "manual attendance recorded"
            ),
            Err(e) => rejected("manual", actor, e),
        }
        result
    }

    /// Changes status or notes of a live record.
    pub async fn amend_attendance<C>(
        &self,
        db: &C,
        actor: &Actor,
        id: i64,
        status: Option<AttendanceStatus>,
        notes: Option<String>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManualOverride)?;
        let record = AttendanceLedger::amend(db, id, status, notes).await?;
        tracing::info!(record_id = id, actor_id = actor.id, status = %record.status, "attendance amended");
        Ok(record)
    }

    /// Tombstones a record, freeing its slot for the day.
    pub async fn delete_attendance<C>(
        &self,
        db: &C,
        actor: &Actor,
        id: i64,
    ) -> Result<(), PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManualOverride)?;
        AttendanceLedger::soft_delete(db, id).await?;
        tracing::info!(record_id = id, actor_id = actor.id, "attendance deleted");
        Ok(())
    }

    /// Page of `user_id`'s live records in `[from, to]`, newest first.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_records<C>(
        &self,
        db: &C,
        actor: &Actor,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<attendance_record::Model>, u64), PresenceError>
    where
        C: ConnectionTrait,
    {
        if user_id != actor.id {
            actor.require(Capability::ViewOthers)?;
        }
        check_range(from, to)?;
        if !(1..=MAX_PAGE).contains(&page) || !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(PresenceError::Validation(format!(
                "page must be within 1..={MAX_PAGE} and per_page within 1..={MAX_PER_PAGE}"
            )));
        }
        let filter = AttendanceFilter::new()
            .with_user_id(user_id)
            .with_range(from, to);
        AttendanceLedger::list(db, &filter, page, per_page).await
    }

    /// Live records of one class schedule. Lecturers only see their own classes.
    pub async fn schedule_records<C>(
        &self,
        db: &C,
        actor: &Actor,
        schedule_id: i64,
    ) -> Result<Vec<attendance_record::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ViewOthers)?;
        let schedule = ScheduleCatalog::schedule_by_id(db, schedule_id).await?;
        if schedule.lecturer_id != actor.id && !actor.can(Capability::IssueAnySession) {
            return Err(PresenceError::Forbidden(format!(
                "class schedule {schedule_id} is not taught by user {}",
                actor.id
            )));
        }
        AttendanceLedger::records_for_schedule(db, schedule_id).await
    }

    /// Live records of every schedule of `course_id` in `[from, to]`, newest
    /// first. Lecturers must teach at least one of the course's schedules.
    pub async fn course_records<C>(
        &self,
        db: &C,
        actor: &Actor,
        course_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<attendance_record::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ViewOthers)?;
        check_range(from, to)?;
        let schedules = class_schedule::Model::find_for_course(db, course_id).await?;
        if !actor.can(Capability::IssueAnySession)
            && !schedules.iter().any(|s| s.lecturer_id == actor.id)
        {
            return Err(PresenceError::Forbidden(format!(
                "course {course_id} is not taught by user {}",
                actor.id
            )));
        }

        let filter = AttendanceFilter::new()
            .with_schedule_ids(schedules.iter().map(|s| s.id).collect())
            .with_range(from, to);
        Ok(attendance_record::Model::find_matching(db, &filter).await?)
    }

    /// Today's classes, the next few meetings, the open campus tap and
    /// all-time statistics of `actor`.
    pub async fn overview<C>(
        &self,
        db: &C,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<AttendanceOverview, PresenceError>
    where
        C: ConnectionTrait,
    {
        let date = self.policy.local_date(now);
        let lecturer = (actor.can(Capability::IssueSession)
            && !actor.can(Capability::IssueAnySession))
        .then_some(actor.id);

        let schedules = class_schedule::Model::find_active(db, lecturer).await?;
        let upcoming = ScheduleCatalog::upcoming_meetings(
            &schedules,
            now,
            &self.policy,
            UPCOMING_DAYS,
            UPCOMING_LIMIT,
        );
        let today = schedules.into_iter().filter(|s| s.meets_on(date)).collect();
        let open_tap = AttendanceLedger::tap_status(db, actor.id, date).await?.record;
        let statistics = AttendanceLedger::statistics(db, actor.id, None, None).await?;

        Ok(AttendanceOverview {
            date,
            today,
            upcoming,
            open_tap,
            statistics,
        })
    }

    /// Statistics for `user_id`. Reading someone else's needs `ViewOthers`.
    pub async fn statistics<C>(
        &self,
        db: &C,
        actor: &Actor,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AttendanceStats, PresenceError>
    where
        C: ConnectionTrait,
    {
        if user_id != actor.id {
            actor.require(Capability::ViewOthers)?;
        }
        check_range(from, to)?;
        AttendanceLedger::statistics(db, user_id, from, to).await
    }

    pub async fn check_in<C>(
        &self,
        db: &C,
        actor: &Actor,
        work_schedule_id: i64,
        location: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<work_attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let result = async {
            actor.require(Capability::WorkCheck)?;
            let schedule = self.own_work_schedule(db, actor, work_schedule_id).await?;
            let window = ScheduleCatalog::shift_window(&schedule, self.policy.campus_offset)?;

            let opens = window.starts - Duration::minutes(EARLY_CHECK_IN_MINUTES);
            if now < opens.with_timezone(&Utc) || now >= window.ends.with_timezone(&Utc) {
                return Err(PresenceError::OutsideShiftWindow {
                    opens,
                    closes: window.ends,
                });
            }

            let zone = AttendanceLedger::zone_for(db, location).await?;

            // `closes - ends` is the schedule's grace.
            let late_after = window.starts + (window.closes - window.ends);
            let (status, minutes_offset) = if now > late_after.with_timezone(&Utc) {
                let late = now - window.starts.with_timezone(&Utc);
                (WorkStatus::Late, late.num_minutes() as i32)
            } else {
                (WorkStatus::OnTime, 0)
            };

            AttendanceLedger::record_work_check_in(
                db,
                NewWorkAttendance {
                    user_id: actor.id,
                    work_schedule_id,
                    date: schedule.date,
                    kind: AttendanceKind::WorkCheckIn,
                    status,
                    minutes_offset,
                    at: now,
                    latitude: location.map(|p| p.latitude),
                    longitude: location.map(|p| p.longitude),
                    geofence_id: zone.map(|z| z.id),
                },
            )
            .await
        }
        .await;

        match &result {
            Ok(rec) => tracing::info!(
                actor_id = actor.id,
                work_schedule_id,
                status = %rec.status,
                "work check-in recorded"
            ),
            Err(e) => rejected("work_check_in", actor, e),
        }
        result
    }

    pub async fn check_out<C>(
        &self,
        db: &C,
        actor: &Actor,
        work_schedule_id: i64,
        location: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<work_attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let result = async {
            actor.require(Capability::WorkCheck)?;
            let schedule = self.own_work_schedule(db, actor, work_schedule_id).await?;
            let window = ScheduleCatalog::shift_window(&schedule, self.policy.campus_offset)?;

            let opens = window.starts - Duration::minutes(EARLY_CHECK_IN_MINUTES);
            let closes = window.ends + Duration::minutes(LATE_CHECK_OUT_MINUTES);
            if now < opens.with_timezone(&Utc) || now > closes.with_timezone(&Utc) {
                return Err(PresenceError::OutsideShiftWindow { opens, closes });
            }

            let zone = AttendanceLedger::zone_for(db, location).await?;

            // Leaving within the grace before the end still counts as on time.
            let (status, minutes_offset) = if now < window.ends.with_timezone(&Utc)
                - (window.closes - window.ends)
            {
                let early = window.ends.with_timezone(&Utc) - now;
                (WorkStatus::EarlyLeave, early.num_minutes() as i32)
            } else {
                (WorkStatus::OnTime, 0)
            };

            AttendanceLedger::record_work_check_out(
                db,
                NewWorkAttendance {
                    user_id: actor.id,
                    work_schedule_id,
                    date: schedule.date,
                    kind: AttendanceKind::WorkCheckOut,
                    status,
                    minutes_offset,
                    at: now,
                    latitude: location.map(|p| p.latitude),
                    longitude: location.map(|p| p.longitude),
                    geofence_id: zone.map(|z| z.id),
                },
            )
            .await
        }
        .await;

        match &result {
            Ok(rec) => tracing::info!(
                actor_id = actor.id,
                work_schedule_id,
                status = %rec.status,
                "work check-out recorded"
            ),
            Err(e) => rejected("work_check_out", actor, e),
        }
        result
    }

    async fn own_work_schedule<C>(
        &self,
        db: &C,
        actor: &Actor,
        work_schedule_id: i64,
    ) -> Result<db::models::work_schedule::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let schedule = ScheduleCatalog::work_schedule_by_id(db, work_schedule_id).await?;
        if schedule.user_id != actor.id {
            return Err(PresenceError::Forbidden(format!(
                "work schedule {work_schedule_id} belongs to another user"
            )));
        }
        Ok(schedule)
    }
}
