//! Owner of attendance facts: insert-or-fail recording, campus taps,
//! overrides and statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use db::filters::AttendanceFilter;
use db::models::attendance_record::{
    self, AttendanceKind, AttendanceStatus, NewAttendanceRecord, TapClose, OPEN_TAP_CONTEXT,
};
use db::models::geofence;
use db::models::work_attendance_record::{self, NewWorkAttendance};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;

use crate::error::{PresenceError, is_unique_violation};
use crate::geo::{self, Coordinates};

/// What a QR or manual fact is about. Determines its uniqueness slot for the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceContext {
    Schedule(i64),
    /// Free-form manual context such as an event name.
    Label(String),
}

impl AttendanceContext {
    pub fn key(&self) -> String {
        match self {
            AttendanceContext::Schedule(id) => format!("schedule:{id}"),
            AttendanceContext::Label(label) => format!("manual:{}", label.trim().to_lowercase()),
        }
    }

    pub fn schedule_id(&self) -> Option<i64> {
        match self {
            AttendanceContext::Schedule(id) => Some(*id),
            AttendanceContext::Label(_) => None,
        }
    }
}

/// Everything needed to write one attendance fact.
#[derive(Debug, Clone)]
pub struct AttendanceFact {
    pub actor_id: i64,
    pub date: NaiveDate,
    pub context: AttendanceContext,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub at: DateTime<Utc>,
    pub session_id: Option<i64>,
    pub location: Option<Coordinates>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
    pub attendance_rate: f64,
}

/// Open campus tap of today, if any.
#[derive(Debug, Clone, Serialize)]
pub struct TapStatus {
    pub tapped_in: bool,
    pub record: Option<attendance_record::Model>,
}

pub struct AttendanceLedger;

impl AttendanceLedger {
    /// Inserts one fact. A second fact for the same (actor, date, context)
    /// fails with `DuplicateAttendance` and leaves the first untouched.
    pub async fn record_attendance<C>(
        db: &C,
        fact: AttendanceFact,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let context_key = fact.context.key();
        let new = NewAttendanceRecord {
            user_id: fact.actor_id,
            date: fact.date,
            kind: fact.kind,
            status: fact.status,
            context_key: context_key.clone(),
            schedule_id: fact.context.schedule_id(),
            session_id: fact.session_id,
            geofence_id: None,
            at: fact.at,
            latitude: fact.location.map(|c| c.latitude),
            longitude: fact.location.map(|c| c.longitude),
            notes: fact.notes,
            created_by: fact.created_by,
        };

        attendance_record::Model::create(db, new)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PresenceError::DuplicateAttendance {
                        context: context_key,
                        date: fact.date.to_string(),
                    }
                } else {
                    PresenceError::Database(e)
                }
            })
    }

    /// Opens a campus tap for `actor_id` on `date` at the first active zone
    /// containing `at_point`.
    pub async fn open_tap_in<C>(
        db: &C,
        actor_id: i64,
        at_point: Coordinates,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        at_point.validate()?;

        if attendance_record::Model::find_open_tap(db, actor_id, date)
            .await?
            .is_some()
        {
            return Err(PresenceError::AlreadyTappedIn);
        }

        let zone = Self::resolve_zone(db, at_point).await?;

        let new = NewAttendanceRecord {
            user_id: actor_id,
            date,
            kind: AttendanceKind::GeofenceTapIn,
            status: AttendanceStatus::Present,
            context_key: OPEN_TAP_CONTEXT.to_string(),
            schedule_id: None,
            session_id: None,
            geofence_id: Some(zone.id),
            at: now,
            latitude: Some(at_point.latitude),
            longitude: Some(at_point.longitude),
            notes: None,
            created_by: None,
        };

        // A concurrent tap-in that won the race shows up as a unique violation.
        attendance_record::Model::create(db, new)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PresenceError::AlreadyTappedIn
                } else {
                    PresenceError::Database(e)
                }
            })
    }

    /// Closes today's open tap. Never creates a record.
    pub async fn close_tap_out<C>(
        db: &C,
        actor_id: i64,
        at_point: Coordinates,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        at_point.validate()?;

        let open = attendance_record::Model::find_open_tap(db, actor_id, date)
            .await?
            .ok_or(PresenceError::NoOpenTapIn)?;

        let zone = Self::resolve_zone(db, at_point).await?;

        let closed = attendance_record::Model::close_tap(
            db,
            open.id,
            TapClose {
                at: now,
                latitude: at_point.latitude,
                longitude: at_point.longitude,
                geofence_id: zone.id,
            },
        )
        .await?;
        if !closed {
            return Err(PresenceError::NoOpenTapIn);
        }

        attendance_record::Model::find_live(db, open.id)
            .await?
            .ok_or(PresenceError::AttendanceNotFound(open.id))
    }

    pub async fn tap_status<C>(
        db: &C,
        actor_id: i64,
        date: NaiveDate,
    ) -> Result<TapStatus, PresenceError>
    where
        C: ConnectionTrait,
    {
        let record = attendance_record::Model::find_open_tap(db, actor_id, date).await?;
        Ok(TapStatus {
            tapped_in: record.is_some(),
            record,
        })
    }

    /// Aggregate over the actor's live records in `[from, to]`.
    pub async fn statistics<C>(
        db: &C,
        actor_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AttendanceStats, PresenceError>
    where
        C: ConnectionTrait,
    {
        let filter = AttendanceFilter::new()
            .with_user_id(actor_id)
            .with_range(from, to);

        let by_status: BTreeMap<String, i64> =
            attendance_record::Model::count_by_status(db, &filter)
                .await?
                .into_iter()
                .collect();
        let by_type: BTreeMap<String, i64> = attendance_record::Model::count_by_kind(db, &filter)
            .await?
            .into_iter()
            .collect();

        let total: i64 = by_status.values().sum();
        let present = by_status
            .get(&AttendanceStatus::Present.to_string())
            .copied()
            .unwrap_or(0);

        Ok(AttendanceStats {
            total,
            by_status,
            by_type,
            attendance_rate: attendance_rate(present, total),
        })
    }

    pub async fn list<C>(
        db: &C,
        filter: &AttendanceFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<attendance_record::Model>, u64), PresenceError>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_record::Model::list(db, filter, page, per_page).await?)
    }

    pub async fn record_by_id<C>(
        db: &C,
        id: i64,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        attendance_record::Model::find_live(db, id)
            .await?
            .ok_or(PresenceError::AttendanceNotFound(id))
    }

    pub async fn records_for_schedule<C>(
        db: &C,
        schedule_id: i64,
    ) -> Result<Vec<attendance_record::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_record::Model::find_for_schedule(db, schedule_id).await?)
    }

    pub async fn amend<C>(
        db: &C,
        id: i64,
        status: Option<AttendanceStatus>,
        notes: Option<String>,
    ) -> Result<attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        attendance_record::Model::amend(db, id, status, notes)
            .await?
            .ok_or(PresenceError::AttendanceNotFound(id))
    }

    pub async fn soft_delete<C>(db: &C, id: i64) -> Result<(), PresenceError>
    where
        C: ConnectionTrait,
    {
        if attendance_record::Model::soft_delete(db, id).await? {
            Ok(())
        } else {
            Err(PresenceError::AttendanceNotFound(id))
        }
    }

    /// Writes the check-in fact of a work schedule.
    pub async fn record_work_check_in<C>(
        db: &C,
        new: NewWorkAttendance,
    ) -> Result<work_attendance_record::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let schedule_id = new.work_schedule_id;
        work_attendance_record::Model::create(db, new)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PresenceError::AlreadyCheckedIn(schedule_id)
                } else {
                    PresenceError::Database(e)
                }
            })
    }

    /// Writes the check-out fact of a work schedule. The check-in lookup and
    /// the insert run in one transaction.
    pub async fn record_work_check_out<C>(
        db: &C,
        new: NewWorkAttendance,
    ) -> Result<work_attendance_record::Model, PresenceError>
    where
        C: TransactionTrait,
    {
        let schedule_id = new.work_schedule_id;
        let txn = db.begin().await?;

        let checked_in = work_attendance_record::Model::find_one(
            &txn,
            new.user_id,
            schedule_id,
            AttendanceKind::WorkCheckIn,
        )
        .await?;
        if checked_in.is_none() {
            txn.rollback().await?;
            return Err(PresenceError::NoOpenCheckIn(schedule_id));
        }

        match work_attendance_record::Model::create(&txn, new).await {
            Ok(created) => {
                txn.commit().await?;
                Ok(created)
            }
            Err(e) => {
                txn.rollback().await?;
                if is_unique_violation(&e) {
                    Err(PresenceError::AlreadyCheckedOut(schedule_id))
                } else {
                    Err(PresenceError::Database(e))
                }
            }
        }
    }

    async fn resolve_zone<C>(db: &C, point: Coordinates) -> Result<geofence::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let zones = geofence::Model::find_active(db).await?;
        geo::locate(point, &zones)
            .cloned()
            .map_err(|miss| miss.into_error(point))
    }

    /// Zone lookup for flows where coordinates are optional.
    pub async fn zone_for<C>(
        db: &C,
        point: Option<Coordinates>,
    ) -> Result<Option<geofence::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        match point {
            Some(p) => {
                p.validate()?;
                Self::resolve_zone(db, p).await.map(Some)
            }
            None => Ok(None),
        }
    }
}

/// `present / total * 100`, zero when there is nothing to count.
pub fn attendance_rate(present: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        present as f64 / total as f64 * 100.0
    }
}
