//! Administration of shift patterns, shift assignments and work schedules.

use chrono::{NaiveDate, NaiveTime};
use db::filters::WorkFilter;
use db::models::shift_pattern::{self, ShiftPatternChanges};
use db::models::user_shift;
use db::models::work_attendance_record;
use db::models::work_schedule::{self, NewWorkSchedule};
use sea_orm::ConnectionTrait;

use crate::capability::{Actor, Capability};
use crate::error::{PresenceError, is_unique_violation};

#[derive(Debug, Clone)]
pub struct NewShiftPattern {
    pub code: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grace_minutes: i32,
}

/// Work day request. Missing times are taken from the given pattern, or from
/// the pattern of the user's shift assignment effective on `date`.
#[derive(Debug, Clone)]
pub struct WorkScheduleRequest {
    pub user_id: i64,
    pub date: NaiveDate,
    pub shift_pattern_id: Option<i64>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub grace_minutes: Option<i32>,
    pub notes: Option<String>,
}

pub struct ShiftAdmin;

fn validate_times(start: NaiveTime, end: NaiveTime) -> Result<(), PresenceError> {
    if start == end {
        return Err(PresenceError::Validation(
            "start_time and end_time must differ".into(),
        ));
    }
    Ok(())
}

fn validate_grace(grace: i32) -> Result<(), PresenceError> {
    if !(0..=240).contains(&grace) {
        return Err(PresenceError::Validation(format!(
            "grace_minutes must be between 0 and 240, got {grace}"
        )));
    }
    Ok(())
}

impl ShiftAdmin {
    pub async fn create_shift_pattern<C>(
        db: &C,
        actor: &Actor,
        new: NewShiftPattern,
    ) -> Result<shift_pattern::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageShifts)?;

        let code = new.code.trim().to_uppercase();
        if code.is_empty() || code.contains('#') {
            return Err(PresenceError::Validation(
                "code must be non-empty and may not contain '#'".into(),
            ));
        }
        validate_times(new.start_time, new.end_time)?;
        validate_grace(new.grace_minutes)?;

        let created = shift_pattern::Model::create(
            db,
            &code,
            new.name.trim(),
            new.start_time,
            new.end_time,
            new.grace_minutes,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PresenceError::DuplicateShiftCode(code.clone())
            } else {
                PresenceError::Database(e)
            }
        })?;

        tracing::info!(shift_pattern_id = created.id, code = %created.code, actor_id = actor.id, "shift pattern created");
        Ok(created)
    }

    pub async fn update_shift_pattern<C>(
        db: &C,
        actor: &Actor,
        id: i64,
        changes: ShiftPatternChanges,
    ) -> Result<shift_pattern::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageShifts)?;

        let current = Self::shift_pattern_by_id(db, id).await?;
        validate_times(
            changes.start_time.unwrap_or(current.start_time),
            changes.end_time.unwrap_or(current.end_time),
        )?;
        if let Some(grace) = changes.grace_minutes {
            validate_grace(grace)?;
        }

        shift_pattern::Model::apply_changes(db, id, changes)
            .await?
            .ok_or(PresenceError::ShiftPatternNotFound(id))
    }

    pub async fn delete_shift_pattern<C>(
        db: &C,
        actor: &Actor,
        id: i64,
    ) -> Result<(), PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageShifts)?;

        if shift_pattern::Model::soft_delete(db, id).await? {
            tracing::info!(shift_pattern_id = id, actor_id = actor.id, "shift pattern deleted");
            Ok(())
        } else {
            Err(PresenceError::ShiftPatternNotFound(id))
        }
    }

    pub async fn shift_pattern_by_id<C>(
        db: &C,
        id: i64,
    ) -> Result<shift_pattern::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        shift_pattern::Model::find_live(db, id)
            .await?
            .ok_or(PresenceError::ShiftPatternNotFound(id))
    }

    pub async fn list_shift_patterns<C>(
        db: &C,
        active_only: bool,
    ) -> Result<Vec<shift_pattern::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        Ok(shift_pattern::Model::list(db, active_only).await?)
    }

    pub async fn create_user_shift<C>(
        db: &C,
        actor: &Actor,
        user_id: i64,
        shift_pattern_id: i64,
        effective_from: NaiveDate,
        effective_until: Option<NaiveDate>,
    ) -> Result<user_shift::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageShifts)?;

        if let Some(until) = effective_until {
            if until < effective_from {
                return Err(PresenceError::Validation(format!(
                    "effective_until {until} is before effective_from {effective_from}"
                )));
            }
        }
        Self::shift_pattern_by_id(db, shift_pattern_id).await?;

        Ok(user_shift::Model::create(db, user_id, shift_pattern_id, effective_from, effective_until).await?)
    }

    pub async fn user_shifts_for<C>(
        db: &C,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<user_shift::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        Ok(user_shift::Model::find_for_user(db, user_id, date).await?)
    }

    pub async fn create_work_schedule<C>(
        db: &C,
        actor: &Actor,
        req: WorkScheduleRequest,
    ) -> Result<work_schedule::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageShifts)?;

        let pattern = match req.shift_pattern_id {
            Some(id) => Some(Self::shift_pattern_by_id(db, id).await?),
            None => match user_shift::Model::effective_on(db, req.user_id, req.date).await? {
                Some(assignment) => {
                    shift_pattern::Model::find_live(db, assignment.shift_pattern_id).await?
                }
                None => None,
            },
        };

        let start_time = req.start_time.or(pattern.as_ref().map(|p| p.start_time));
        let end_time = req.end_time.or(pattern.as_ref().map(|p| p.end_time));
        let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
            return Err(PresenceError::Validation(format!(
                "no times given and user {} has no shift on {}",
                req.user_id, req.date
            )));
        };
        validate_times(start_time, end_time)?;

        let grace_minutes = req
            .grace_minutes
            .or(pattern.as_ref().map(|p| p.grace_minutes))
            .unwrap_or(0);
        validate_grace(grace_minutes)?;

        let created = work_schedule::Model::create(
            db,
            NewWorkSchedule {
                user_id: req.user_id,
                shift_pattern_id: pattern.as_ref().map(|p| p.id),
                date: req.date,
                start_time,
                end_time,
                grace_minutes,
                notes: req.notes,
            },
        )
        .await?;

        tracing::info!(work_schedule_id = created.id, user_id = created.user_id, date = %created.date, "work schedule created");
        Ok(created)
    }

    pub async fn work_schedules_for<C>(
        db: &C,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<work_schedule::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        let filter = WorkFilter::new().with_user_id(user_id).with_range(from, to);
        Ok(work_schedule::Model::list(db, &filter).await?)
    }

    pub async fn work_records_for<C>(
        db: &C,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<work_attendance_record::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        let filter = WorkFilter::new().with_user_id(user_id).with_range(from, to);
        Ok(work_attendance_record::Model::list(db, &filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Role;
    use crate::error::ErrorKind;
    use db::test_utils::setup_test_db;

    const ADMIN: Actor = Actor { id: 1, role: Role::Admin };
    const LECTURER: Actor = Actor { id: 2, role: Role::Lecturer };

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn day_shift() -> NewShiftPattern {
        NewShiftPattern {
            code: " day ".into(),
            name: "Day shift".into(),
            start_time: t(8),
            end_time: t(16),
            grace_minutes: 10,
        }
    }

    #[tokio::test]
    async fn pattern_crud() {
        let db = setup_test_db().await;

        let err = ShiftAdmin::create_shift_pattern(&db, &LECTURER, day_shift())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let p = ShiftAdmin::create_shift_pattern(&db, &ADMIN, day_shift()).await.unwrap();
        assert_eq!(p.code, "DAY");

        let err = ShiftAdmin::create_shift_pattern(&db, &ADMIN, day_shift())
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::DuplicateShiftCode(ref c) if c == "DAY"));

        let updated = ShiftAdmin::update_shift_pattern(
            &db,
            &ADMIN,
            p.id,
            ShiftPatternChanges {
                name: Some("Morning".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Morning");

        let err = ShiftAdmin::update_shift_pattern(
            &db,
            &ADMIN,
            p.id,
            ShiftPatternChanges {
                end_time: Some(t(8)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PresenceError::Validation(_)));

        ShiftAdmin::delete_shift_pattern(&db, &ADMIN, p.id).await.unwrap();
        assert!(matches!(
            ShiftAdmin::shift_pattern_by_id(&db, p.id).await,
            Err(PresenceError::ShiftPatternNotFound(_))
        ));
        ShiftAdmin::create_shift_pattern(&db, &ADMIN, day_shift()).await.unwrap();
    }

    #[tokio::test]
    async fn user_shift_range_must_be_ordered() {
        let db = setup_test_db().await;
        let p = ShiftAdmin::create_shift_pattern(&db, &ADMIN, day_shift()).await.unwrap();

        let err = ShiftAdmin::create_user_shift(&db, &ADMIN, 5, p.id, d(10, 2), Some(d(10, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::Validation(_)));

        let err = ShiftAdmin::create_user_shift(&db, &ADMIN, 5, 999, d(10, 1), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        ShiftAdmin::create_user_shift(&db, &ADMIN, 5, p.id, d(10, 1), Some(d(10, 31)))
            .await
            .unwrap();
        assert_eq!(ShiftAdmin::user_shifts_for(&db, 5, Some(d(10, 15))).await.unwrap().len(), 1);
        assert!(ShiftAdmin::user_shifts_for(&db, 5, Some(d(11, 1))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn work_schedule_times_default_from_effective_shift() {
        let db = setup_test_db().await;
        let p = ShiftAdmin::create_shift_pattern(&db, &ADMIN, day_shift()).await.unwrap();
        ShiftAdmin::create_user_shift(&db, &ADMIN, 5, p.id, d(10, 1), None)
            .await
            .unwrap();

        let req = WorkScheduleRequest {
            user_id: 5,
            date: d(10, 6),
            shift_pattern_id: None,
            start_time: None,
            end_time: None,
            grace_minutes: None,
            notes: None,
        };
        let ws = ShiftAdmin::create_work_schedule(&db, &ADMIN, req.clone()).await.unwrap();
        assert_eq!(ws.start_time, t(8));
        assert_eq!(ws.end_time, t(16));
        assert_eq!(ws.grace_minutes, 10);
        assert_eq!(ws.shift_pattern_id, Some(p.id));

        let no_shift = WorkScheduleRequest { user_id: 6, ..req.clone() };
        assert!(matches!(
            ShiftAdmin::create_work_schedule(&db, &ADMIN, no_shift).await,
            Err(PresenceError::Validation(_))
        ));

        let explicit = WorkScheduleRequest {
            user_id: 6,
            start_time: Some(t(22)),
            end_time: Some(t(6)),
            ..req
        };
        let night = ShiftAdmin::create_work_schedule(&db, &ADMIN, explicit).await.unwrap();
        assert_eq!(night.shift_pattern_id, None);

        let listed = ShiftAdmin::work_schedules_for(&db, 5, Some(d(10, 1)), Some(d(10, 31)))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
