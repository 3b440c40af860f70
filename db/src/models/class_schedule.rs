use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

/// A class meeting slot. Either pinned to one `date` or recurring on an ISO
/// `day_of_week` (1 = Monday .. 7 = Sunday).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "class_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub lecturer_id: i64,
    pub room: Option<String>,
    pub date: Option<NaiveDate>,
    pub day_of_week: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields accepted when creating a schedule.
#[derive(Debug, Clone)]
pub struct NewClassSchedule {
    pub course_id: i64,
    pub lecturer_id: i64,
    pub room: Option<String>,
    pub date: Option<NaiveDate>,
    pub day_of_week: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Partial update of a schedule. Absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct ClassScheduleChanges {
    pub room: Option<String>,
    pub date: Option<NaiveDate>,
    pub day_of_week: Option<i32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

impl Model {
    pub async fn create<C>(db: &C, new: NewClassSchedule) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        ActiveModel {
            course_id: Set(new.course_id),
            lecturer_id: Set(new.lecturer_id),
            room: Set(new.room),
            date: Set(new.date),
            day_of_week: Set(new.day_of_week),
            start_time: Set(new.start_time),
            end_time: Set(new.end_time),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Looks a schedule up by id, ignoring soft-deleted rows.
    pub async fn find_live<C>(db: &C, id: i64) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Every live schedule taught by `lecturer_id`, ordered by start time.
    pub async fn find_for_lecturer<C>(db: &C, lecturer_id: i64) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::LecturerId.eq(lecturer_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::StartTime)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Whether this schedule has a meeting on `date`.
    pub fn meets_on(&self, date: NaiveDate) -> bool {
        match (self.date, self.day_of_week) {
            (Some(d), _) => d == date,
            (None, Some(dow)) => date.weekday().number_from_monday() as i32 == dow,
            (None, None) => false,
        }
    }

    /// Live, active schedules, optionally narrowed to one lecturer, by start
    /// time.
    pub async fn find_active<C>(db: &C, lecturer_id: Option<i64>) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = Entity::find()
            .filter(Column::DeletedAt.is_null())
            .filter(Column::IsActive.eq(true));
        if let Some(lecturer_id) = lecturer_id {
            query = query.filter(Column::LecturerId.eq(lecturer_id));
        }
        query
            .order_by_asc(Column::StartTime)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Every live schedule of one course, active or not.
    pub async fn find_for_course<C>(db: &C, course_id: i64) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Overwrites the fields present in `changes`. Setting `date` clears
    /// `day_of_week` and the other way round. `None` for an unknown or
    /// deleted schedule.
    pub async fn apply_changes<C>(
        db: &C,
        id: i64,
        changes: ClassScheduleChanges,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_live(db, id).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();
        if let Some(room) = changes.room {
            active.room = Set(Some(room));
        }
        if let Some(date) = changes.date {
            active.date = Set(Some(date));
            active.day_of_week = Set(None);
        }
        if let Some(dow) = changes.day_of_week {
            active.day_of_week = Set(Some(dow));
            active.date = Set(None);
        }
        if let Some(start) = changes.start_time {
            active.start_time = Set(start);
        }
        if let Some(end) = changes.end_time {
            active.end_time = Set(end);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await.map(Some)
    }

    /// Tombstones and deactivates a schedule. `false` when it was already gone.
    pub async fn soft_delete<C>(db: &C, id: i64) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let res = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn recurring_schedule_meets_on_its_weekday_only() {
        let db = setup_test_db().await;
        let s = Model::create(
            &db,
            NewClassSchedule {
                course_id: 1,
                lecturer_id: 7,
                room: Some("A-101".into()),
                date: None,
                day_of_week: Some(3),
                start_time: t(8, 0),
                end_time: t(10, 0),
            },
        )
        .await
        .unwrap();

        // 2025-10-01 is a Wednesday.
        assert!(s.meets_on(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
        assert!(!s.meets_on(NaiveDate::from_ymd_opt(2025, 10, 2).unwrap()));

        let listed = Model::find_for_lecturer(&db, 7).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(Model::find_for_lecturer(&db, 8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn changes_switch_recurrence_and_delete_hides() {
        let db = setup_test_db().await;
        let s = Model::create(
            &db,
            NewClassSchedule {
                course_id: 4,
                lecturer_id: 7,
                room: None,
                date: NaiveDate::from_ymd_opt(2025, 10, 1),
                day_of_week: None,
                start_time: t(8, 0),
                end_time: t(10, 0),
            },
        )
        .await
        .unwrap();

        let changed = Model::apply_changes(
            &db,
            s.id,
            ClassScheduleChanges {
                day_of_week: Some(2),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!((changed.date, changed.day_of_week), (None, Some(2)));
        assert!(!changed.is_active);
        assert!(Model::find_active(&db, Some(7)).await.unwrap().is_empty());
        assert_eq!(Model::find_for_course(&db, 4).await.unwrap().len(), 1);

        assert!(Model::soft_delete(&db, s.id).await.unwrap());
        assert!(!Model::soft_delete(&db, s.id).await.unwrap());
        assert!(Model::find_live(&db, s.id).await.unwrap().is_none());
        assert!(Model::find_for_course(&db, 4).await.unwrap().is_empty());
        assert!(
            Model::apply_changes(&db, s.id, ClassScheduleChanges::default())
                .await
                .unwrap()
                .is_none()
        );
    }
}
