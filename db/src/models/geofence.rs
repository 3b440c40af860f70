use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

/// A named circular zone on campus.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "geofences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C>(
        db: &C,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        ActiveModel {
            name: Set(name.to_owned()),
            latitude: Set(latitude),
            longitude: Set(longitude),
            radius_meters: Set(radius_meters),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Active, non-deleted zones in ascending id order.
    ///
    /// Containment checks walk this list and take the first hit, so the order
    /// is part of the contract.
    pub async fn find_active<C>(db: &C) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Tombstones a zone. Returns `false` when it was missing or already deleted.
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
        Ok(res.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn find_active_is_ordered_and_skips_deleted() {
        let db = setup_test_db().await;
        let a = Model::create(&db, "Library", 0.0, 0.0, 100.0).await.unwrap();
        let b = Model::create(&db, "Main Gate", 0.001, 0.001, 50.0).await.unwrap();
        let c = Model::create(&db, "Hall", 0.002, 0.002, 80.0).await.unwrap();

        assert!(Model::soft_delete(&db, b.id).await.unwrap());
        assert!(!Model::soft_delete(&db, b.id).await.unwrap());

        let ids: Vec<i64> = Model::find_active(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }
}
