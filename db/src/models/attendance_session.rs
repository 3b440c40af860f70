use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

/// A time-boxed QR session for one class meeting.
///
/// The store keeps at most one `active` row per schedule (partial unique
/// index). Sessions are never reactivated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub schedule_id: i64,
    pub created_by: i64,
    #[sea_orm(unique)]
    pub token: String,
    pub active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::class_schedule::Column::Id"
    )]
    Schedule,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::class_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C>(
        db: &C,
        schedule_id: i64,
        created_by: i64,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            schedule_id: Set(schedule_id),
            created_by: Set(created_by),
            token: Set(token.to_owned()),
            active: Set(true),
            expires_at: Set(expires_at),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Flips every active session of a schedule to inactive.
    pub async fn deactivate_for_schedule<C>(
        db: &C,
        schedule_id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let res = Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::ScheduleId.eq(schedule_id))
            .filter(Column::Active.eq(true))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn find_by_token<C>(db: &C, token: &str) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::Token.eq(token))
            .one(db)
            .await
    }

    /// The row flagged active for `schedule_id`, expired or not.
    pub async fn find_active_for_schedule<C>(
        db: &C,
        schedule_id: i64,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::ScheduleId.eq(schedule_id))
            .filter(Column::Active.eq(true))
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
