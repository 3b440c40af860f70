use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

/// Template of expected work start/end clock times plus a grace period.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "shift_patterns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub grace_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_shift::Entity")]
    UserShifts,
}

impl Related<super::user_shift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserShifts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ShiftPatternChanges {
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub grace_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

impl Model {
    pub async fn create<C>(
        db: &C,
        code: &str,
        name: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
        grace_minutes: i32,
    ) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        ActiveModel {
            code: Set(code.to_owned()),
            name: Set(name.to_owned()),
            start_time: Set(start_time),
            end_time: Set(end_time),
            grace_minutes: Set(grace_minutes),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_live<C>(db: &C, id: i64) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Live patterns ordered by code.
    pub async fn list<C>(db: &C, active_only: bool) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = Entity::find().filter(Column::DeletedAt.is_null());
        if active_only {
            query = query.filter(Column::IsActive.eq(true));
        }
        query.order_by_asc(Column::Code).all(db).await
    }

    pub async fn apply_changes<C>(
        db: &C,
        id: i64,
        changes: ShiftPatternChanges,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_live(db, id).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(start) = changes.start_time {
            active.start_time = Set(start);
        }
        if let Some(end) = changes.end_time {
            active.end_time = Set(end);
        }
        if let Some(grace) = changes.grace_minutes {
            active.grace_minutes = Set(grace);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await.map(Some)
    }

    /// Tombstones a pattern and renames its code so the code can be reused.
    pub async fn soft_delete<C>(db: &C, id: i64) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_live(db, id).await? else {
            return Ok(false);
        };

        let now = Utc::now();
        let res = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .col_expr(
                Column::Code,
                Expr::value(format!("{}#deleted:{}", model.code, model.id)),
            )
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

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn code_is_unique_until_deleted() {
        let db = setup_test_db().await;
        let day = Model::create(&db, "DAY", "Day shift", t(8), t(16), 10).await.unwrap();
        assert!(Model::create(&db, "DAY", "Again", t(8), t(16), 10).await.is_err());

        assert!(Model::soft_delete(&db, day.id).await.unwrap());
        let again = Model::create(&db, "DAY", "Again", t(8), t(16), 10).await.unwrap();
        let ids: Vec<i64> = Model::list(&db, false)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![again.id]);
    }

    #[tokio::test]
    async fn apply_changes_touches_only_given_fields() {
        let db = setup_test_db().await;
        let p = Model::create(&db, "EVE", "Evening", t(16), t(23), 5).await.unwrap();

        let changed = Model::apply_changes(
            &db,
            p.id,
            ShiftPatternChanges {
                grace_minutes: Some(20),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(changed.grace_minutes, 20);
        assert_eq!(changed.name, "Evening");
        assert!(Model::list(&db, true).await.unwrap().is_empty());
        assert!(Model::apply_changes(&db, 999, ShiftPatternChanges::default())
            .await
            .unwrap()
            .is_none());
    }
}
