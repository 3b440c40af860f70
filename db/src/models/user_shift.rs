use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, QueryOrder};
use serde::Serialize;

/// Assignment of a shift pattern to a person over an effective date range.
/// An open `effective_until` means "until further notice".
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "user_shifts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub shift_pattern_id: i64,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
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
}

impl Related<super::shift_pattern::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShiftPattern.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C>(
        db: &C,
        user_id: i64,
        shift_pattern_id: i64,
        effective_from: NaiveDate,
        effective_until: Option<NaiveDate>,
    ) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        ActiveModel {
            user_id: Set(user_id),
            shift_pattern_id: Set(shift_pattern_id),
            effective_from: Set(effective_from),
            effective_until: Set(effective_until),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Active assignments of `user_id`, latest `effective_from` first. With a
    /// `date`, only assignments covering that day are returned.
    pub async fn find_for_user<C>(
        db: &C,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IsActive.eq(true));

        if let Some(date) = date {
            query = query.filter(Column::EffectiveFrom.lte(date)).filter(
                Condition::any()
                    .add(Column::EffectiveUntil.is_null())
                    .add(Column::EffectiveUntil.gte(date)),
            );
        }

        query
            .order_by_desc(Column::EffectiveFrom)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// The assignment that governs `date`, if any.
    pub async fn effective_on<C>(
        db: &C,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(Self::find_for_user(db, user_id, Some(date))
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shift_pattern;
    use crate::test_utils::setup_test_db;
    use chrono::NaiveTime;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    #[tokio::test]
    async fn effective_on_prefers_latest_covering_assignment() {
        let db = setup_test_db().await;
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let day = shift_pattern::Model::create(&db, "DAY", "Day", t(8), t(16), 10)
            .await
            .unwrap();
        let eve = shift_pattern::Model::create(&db, "EVE", "Eve", t(16), t(23), 10)
            .await
            .unwrap();

        Model::create(&db, 3, day.id, d(1, 1), None).await.unwrap();
        Model::create(&db, 3, eve.id, d(10, 1), Some(d(10, 31))).await.unwrap();

        let oct = Model::effective_on(&db, 3, d(10, 15)).await.unwrap().unwrap();
        assert_eq!(oct.shift_pattern_id, eve.id);

        let nov = Model::effective_on(&db, 3, d(11, 1)).await.unwrap().unwrap();
        assert_eq!(nov.shift_pattern_id, day.id);

        assert!(Model::effective_on(&db, 3, d(1, 1).pred_opt().unwrap())
            .await
            .unwrap()
            .is_none());
        assert_eq!(Model::find_for_user(&db, 3, None).await.unwrap().len(), 2);
    }
}
