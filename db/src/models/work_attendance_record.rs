use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::attendance_record::AttendanceKind;
use crate::filters::WorkFilter;

/// One check-in or check-out fact against a work schedule. The
/// `(user_id, work_schedule_id, kind)` unique index allows exactly one of each.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "work_attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub work_schedule_id: i64,
    pub date: NaiveDate,
    /// `work_check_in` or `work_check_out`.
    pub kind: AttendanceKind,
    pub status: WorkStatus,
    /// Minutes late at check-in, or minutes early at check-out. Zero when on time.
    pub minutes_offset: i32,
    pub recorded_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "work_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WorkStatus {
    #[sea_orm(string_value = "on_time")]
    OnTime,

    #[sea_orm(string_value = "late")]
    Late,

    #[sea_orm(string_value = "early_leave")]
    EarlyLeave,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_schedule::Entity",
        from = "Column::WorkScheduleId",
        to = "super::work_schedule::Column::Id"
    )]
    WorkSchedule,
}

impl Related<super::work_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkSchedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewWorkAttendance {
    pub user_id: i64,
    pub work_schedule_id: i64,
    pub date: NaiveDate,
    pub kind: AttendanceKind,
    pub status: WorkStatus,
    pub minutes_offset: i32,
    pub at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_id: Option<i64>,
}

impl Model {
    pub async fn create<C>(db: &C, new: NewWorkAttendance) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            user_id: Set(new.user_id),
            work_schedule_id: Set(new.work_schedule_id),
            date: Set(new.date),
            kind: Set(new.kind),
            status: Set(new.status),
            minutes_offset: Set(new.minutes_offset),
            recorded_at: Set(new.at),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            geofence_id: Set(new.geofence_id),
            created_at: Set(new.at),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_one<C>(
        db: &C,
        user_id: i64,
        work_schedule_id: i64,
        kind: AttendanceKind,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::WorkScheduleId.eq(work_schedule_id))
            .filter(Column::Kind.eq(kind))
            .one(db)
            .await
    }

    /// Facts matching `filter`, newest day first, check-in before check-out.
    pub async fn list<C>(db: &C, filter: &WorkFilter) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut cond = Condition::all();
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
            .order_by_desc(Column::Date)
            .order_by_asc(Column::WorkScheduleId)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
