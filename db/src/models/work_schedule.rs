use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::filters::WorkFilter;

/// A concrete work day for one person.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "work_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub shift_pattern_id: Option<i64>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grace_minutes: i32,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shift_pattern::Entity",
        from = "Column::ShiftPatternId",
        to = "super::shift_pattern::Column::Id"
    )]
    ShiftPattern,
    #[sea_orm(has_many = "super::work_attendance_record::Entity")]
    Records,
}

impl Related<super::shift_pattern::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShiftPattern.def()
    }
}

impl Related<super::work_attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewWorkSchedule {
    pub user_id: i64,
    pub shift_pattern_id: Option<i64>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grace_minutes: i32,
    pub notes: Option<String>,
}

impl Model {
    pub async fn create<C>(db: &C, new: NewWorkSchedule) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        ActiveModel {
            user_id: Set(new.user_id),
            shift_pattern_id: Set(new.shift_pattern_id),
            date: Set(new.date),
            start_time: Set(new.start_time),
            end_time: Set(new.end_time),
            grace_minutes: Set(new.grace_minutes),
            notes: Set(new.notes),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Active work schedule by id.
    pub async fn find_active<C>(db: &C, id: i64) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id)
            .filter(Column::IsActive.eq(true))
            .one(db)
            .await
    }

    /// Active schedules matching `filter`, by date then start time.
    pub async fn list<C>(db: &C, filter: &WorkFilter) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut cond = Condition::all().add(Column::IsActive.eq(true));
        if let Some(user_id) = filter.user_id {
            cond = cond.add(Column::UserId.eq(user_id));
        }
        if let Some(from) = filter.from {
            cond = cond.add(Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            cond = cond.add(Column::Date.lte(to));
        }

        Entity::find()
            .filter(cond)
            .order_by_asc(Column::Date)
            .order_by_asc(Column::StartTime)
            .all(db)
            .await
    }
}
