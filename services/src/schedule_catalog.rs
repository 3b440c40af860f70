//! Read side of class and work schedules, plus the "is this slot open now"
//! window arithmetic.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use db::models::attendance_record::AttendanceStatus;
use db::models::attendance_session;
use db::models::class_schedule::{self, ClassScheduleChanges, NewClassSchedule};
use db::models::work_schedule;
use sea_orm::{ConnectionTrait, DatabaseTransaction, TransactionTrait};
use serde::Serialize;

use crate::capability::{Actor, Capability};
use crate::error::PresenceError;
use crate::policy::PresencePolicy;

/// A meeting on one calendar date, in campus time.
///
/// `opens`/`closes` are `starts`/`ends` widened by the grace period. When the
/// end clock time is not after the start, the meeting runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub date: NaiveDate,
    pub opens: DateTime<FixedOffset>,
    pub starts: DateTime<FixedOffset>,
    pub ends: DateTime<FixedOffset>,
    pub closes: DateTime<FixedOffset>,
}

impl ScheduleWindow {
    pub fn on(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        grace: Duration,
        offset: FixedOffset,
    ) -> Option<Self> {
        let starts = offset.from_local_datetime(&date.and_time(start)).single()?;
        let end_date = if end <= start { date.succ_opt()? } else { date };
        let ends = offset.from_local_datetime(&end_date.and_time(end)).single()?;
        Some(Self {
            date,
            opens: starts - grace,
            starts,
            ends,
            closes: ends + grace,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.opens.with_timezone(&Utc) && instant <= self.closes.with_timezone(&Utc)
    }

    /// `present` up to and including the start, `late` afterwards.
    pub fn status_at(&self, instant: DateTime<Utc>) -> AttendanceStatus {
        if instant <= self.starts.with_timezone(&Utc) {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Late
        }
    }
}

/// A future meeting of a class schedule, in campus time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingMeeting {
    pub schedule_id: i64,
    pub course_id: i64,
    pub room: Option<String>,
    pub starts: DateTime<FixedOffset>,
    pub ends: DateTime<FixedOffset>,
}

fn validate_shape(
    date: Option<NaiveDate>,
    day_of_week: Option<i32>,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<(), PresenceError> {
    match (date, day_of_week) {
        (Some(_), Some(_)) | (None, None) => {
            return Err(PresenceError::Validation(
                "exactly one of date or day_of_week must be given".into(),
            ));
        }
        (None, Some(dow)) if !(1..=7).contains(&dow) => {
            return Err(PresenceError::Validation(format!(
                "day_of_week must be 1 (Monday) to 7 (Sunday), got {dow}"
            )));
        }
        _ => {}
    }
    if start == end {
        return Err(PresenceError::Validation(
            "start_time and end_time must differ".into(),
        ));
    }
    Ok(())
}

/// Schedule managers may change any schedule, lecturers only those they teach.
fn require_editor(actor: &Actor, schedule: &class_schedule::Model) -> Result<(), PresenceError> {
    if actor.can(Capability::ManageSchedules) {
        return Ok(());
    }
    actor.require(Capability::IssueSession)?;
    if schedule.lecturer_id != actor.id {
        return Err(PresenceError::Forbidden(format!(
            "class schedule {} is not taught by user {}",
            schedule.id, actor.id
        )));
    }
    Ok(())
}

pub struct ScheduleCatalog;

impl ScheduleCatalog {
    pub async fn schedule_by_id<C>(db: &C, id: i64) -> Result<class_schedule::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        class_schedule::Model::find_live(db, id)
            .await?
            .ok_or(PresenceError::ScheduleNotFound(id))
    }

    /// Schedules of `lecturer_id` that meet on `date`.
    pub async fn schedules_for_lecturer<C>(
        db: &C,
        lecturer_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<class_schedule::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        let all = class_schedule::Model::find_for_lecturer(db, lecturer_id).await?;
        Ok(all.into_iter().filter(|s| s.meets_on(date)).collect())
    }

    /// The meeting of `schedule` whose graced window covers `instant`.
    ///
    /// Looks at the campus date of `instant` and its neighbours so windows that
    /// straddle midnight are found from either side.
    pub fn meeting_window(
        schedule: &class_schedule::Model,
        instant: DateTime<Utc>,
        grace: Duration,
        offset: FixedOffset,
    ) -> Option<ScheduleWindow> {
        let today = instant.with_timezone(&offset).date_naive();
        [today.pred_opt(), Some(today), today.succ_opt()]
            .into_iter()
            .flatten()
            .filter(|d| schedule.meets_on(*d))
            .filter_map(|d| {
                ScheduleWindow::on(d, schedule.start_time, schedule.end_time, grace, offset)
            })
            .find(|w| w.contains(instant))
    }

    pub fn is_within_window(
        schedule: &class_schedule::Model,
        instant: DateTime<Utc>,
        grace: Duration,
        offset: FixedOffset,
    ) -> bool {
        Self::meeting_window(schedule, instant, grace, offset).is_some()
    }

    /// Meeting date and status for a verification at `instant`, or the reason
    /// it falls outside every meeting.
    pub fn admit(
        schedule: &class_schedule::Model,
        instant: DateTime<Utc>,
        policy: &PresencePolicy,
    ) -> Result<(NaiveDate, AttendanceStatus), PresenceError> {
        if let Some(window) =
            Self::meeting_window(schedule, instant, policy.grace, policy.campus_offset)
        {
            return Ok((window.date, window.status_at(instant)));
        }

        let today = policy.local_date(instant);
        match ScheduleWindow::on(
            today,
            schedule.start_time,
            schedule.end_time,
            policy.grace,
            policy.campus_offset,
        ) {
            Some(w) if schedule.meets_on(today) => Err(PresenceError::OutsideScheduleWindow {
                opens: w.opens,
                closes: w.closes,
            }),
            _ => Err(PresenceError::Validation(format!(
                "class schedule {} has no meeting on {}",
                schedule.id, today
            ))),
        }
    }

    pub async fn create_schedule<C>(
        db: &C,
        actor: &Actor,
        new: NewClassSchedule,
    ) -> Result<class_schedule::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageSchedules)?;
        validate_shape(new.date, new.day_of_week, new.start_time, new.end_time)?;

        let created = class_schedule::Model::create(db, new).await?;
        tracing::info!(
            schedule_id = created.id,
            lecturer_id = created.lecturer_id,
            actor_id = actor.id,
            "class schedule created"
        );
        Ok(created)
    }

    /// Applies `changes` to a live schedule. Deactivating it also retires its
    /// open QR sessions.
    pub async fn update_schedule<C>(
        db: &C,
        actor: &Actor,
        id: i64,
        changes: ClassScheduleChanges,
        now: DateTime<Utc>,
    ) -> Result<class_schedule::Model, PresenceError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let current = Self::schedule_by_id(db, id).await?;
        require_editor(actor, &current)?;

        if changes.date.is_some() && changes.day_of_week.is_some() {
            return Err(PresenceError::Validation(
                "exactly one of date or day_of_week must be given".into(),
            ));
        }
        let (date, day_of_week) = match (changes.date, changes.day_of_week) {
            (Some(date), _) => (Some(date), None),
            (None, Some(dow)) => (None, Some(dow)),
            (None, None) => (current.date, current.day_of_week),
        };
        validate_shape(
            date,
            day_of_week,
            changes.start_time.unwrap_or(current.start_time),
            changes.end_time.unwrap_or(current.end_time),
        )?;

        let deactivating = changes.is_active == Some(false);
        let txn = db.begin().await?;
        match Self::apply_in(&txn, id, changes, deactivating, now).await {
            Ok(updated) => {
                txn.commit().await?;
                tracing::info!(
                    schedule_id = id,
                    actor_id = actor.id,
                    is_active = updated.is_active,
                    "class schedule updated"
                );
                Ok(updated)
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    async fn apply_in(
        txn: &DatabaseTransaction,
        id: i64,
        changes: ClassScheduleChanges,
        deactivating: bool,
        now: DateTime<Utc>,
    ) -> Result<class_schedule::Model, PresenceError> {
        let updated = class_schedule::Model::apply_changes(txn, id, changes)
            .await?
            .ok_or(PresenceError::ScheduleNotFound(id))?;
        if deactivating {
            attendance_session::Model::deactivate_for_schedule(txn, id, now).await?;
        }
        Ok(updated)
    }

    /// Soft-deletes a schedule and retires its QR sessions. Recorded
    /// attendance is kept.
    pub async fn delete_schedule<C>(
        db: &C,
        actor: &Actor,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), PresenceError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let current = Self::schedule_by_id(db, id).await?;
        require_editor(actor, &current)?;

        let txn = db.begin().await?;
        let deleted = class_schedule::Model::soft_delete(&txn, id).await?;
        if !deleted {
            txn.rollback().await?;
            return Err(PresenceError::ScheduleNotFound(id));
        }
        let retired = attendance_session::Model::deactivate_for_schedule(&txn, id, now).await?;
        txn.commit().await?;

        tracing::info!(schedule_id = id, actor_id = actor.id, retired, "class schedule deleted");
        Ok(())
    }

    /// The next `limit` meetings of `schedules` starting after `now`, looking
    /// `days` campus days ahead, earliest first.
    pub fn upcoming_meetings(
        schedules: &[class_schedule::Model],
        now: DateTime<Utc>,
        policy: &PresencePolicy,
        days: u64,
        limit: usize,
    ) -> Vec<UpcomingMeeting> {
        let today = policy.local_date(now);
        let mut meetings: Vec<UpcomingMeeting> = today
            .iter_days()
            .take(days as usize + 1)
            .flat_map(move |date| {
                schedules
                    .iter()
                    .filter(move |s| s.is_active && s.meets_on(date))
                    .filter_map(move |s| {
                        let w = ScheduleWindow::on(
                            date,
                            s.start_time,
                            s.end_time,
                            Duration::zero(),
                            policy.campus_offset,
                        )?;
                        Some(UpcomingMeeting {
                            schedule_id: s.id,
                            course_id: s.course_id,
                            room: s.room.clone(),
                            starts: w.starts,
                            ends: w.ends,
                        })
                    })
            })
            .filter(|m| m.starts.with_timezone(&Utc) > now)
            .collect();
        meetings.sort_by_key(|m| (m.starts, m.schedule_id));
        meetings.truncate(limit);
        meetings
    }

    pub async fn work_schedule_by_id<C>(
        db: &C,
        id: i64,
    ) -> Result<work_schedule::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        work_schedule::Model::find_active(db, id)
            .await?
            .ok_or(PresenceError::WorkScheduleNotFound(id))
    }

    /// The graced window of a work day.
    pub fn shift_window(
        schedule: &work_schedule::Model,
        offset: FixedOffset,
    ) -> Result<ScheduleWindow, PresenceError> {
        ScheduleWindow::on(
            schedule.date,
            schedule.start_time,
            schedule.end_time,
            Duration::minutes(i64::from(schedule.grace_minutes.max(0))),
            offset,
        )
        .ok_or_else(|| {
            PresenceError::Validation(format!("work schedule {} has no valid window", schedule.id))
        })
    }
}
