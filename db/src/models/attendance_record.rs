use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Func;
use sea_orm::{
    Condition, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::filters::AttendanceFilter;

/// Context key shared by every open campus tap. Together with the
/// `(user_id, date, context_key)` unique index it caps open taps at one per
/// person per day.
pub const OPEN_TAP_CONTEXT: &str = "campus:open";

/// One finalized attendance fact.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    /// Uniqueness slot within the day: `schedule:{id}`, `campus:open`,
    /// `campus:{id}` once closed, or a free-form manual context.
    pub context_key: String,
    pub schedule_id: Option<i64>,
    pub session_id: Option<i64>,
    pub geofence_id: Option<i64>,
    pub check_in_at: DateTime<Utc>,
    pub check_out_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub checkout_latitude: Option<f64>,
    pub checkout_longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// How the fact was verified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_kind")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttendanceKind {
    #[sea_orm(string_value = "qr")]
    Qr,

    #[sea_orm(string_value = "geofence_tap_in")]
    GeofenceTapIn,

    #[sea_orm(string_value = "geofence_tap_out")]
    GeofenceTapOut,

    #[sea_orm(string_value = "manual")]
    Manual,

    #[sea_orm(string_value = "work_check_in")]
    WorkCheckIn,

    #[sea_orm(string_value = "work_check_out")]
    WorkCheckOut,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString,
    Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "late")]
    Late,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "excused")]
    Excused,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::class_schedule::Column::Id"
    )]
    Schedule,
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
}

impl Related<super::class_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Insert payload for [`Model::create`].
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub user_id: i64,
    pub date: NaiveDate,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub context_key: String,
    pub schedule_id: Option<i64>,
    pub session_id: Option<i64>,
    pub geofence_id: Option<i64>,
    pub at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

/// Where a tap-out was taken.
#[derive(Debug, Clone, Copy)]
pub struct TapClose {
    pub at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub geofence_id: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    key: String,
    cnt: i64,
}

impl Model {
    /// Plain insert. A clash on `(user_id, date, context_key)` surfaces as a
    /// unique-constraint `DbErr`.
    pub async fn create<C>(db: &C, new: NewAttendanceRecord) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            user_id: Set(new.user_id),
            date: Set(new.date),
            kind: Set(new.kind),
            status: Set(new.status),
            context_key: Set(new.context_key),
            schedule_id: Set(new.schedule_id),
            session_id: Set(new.session_id),
            geofence_id: Set(new.geofence_id),
            check_in_at: Set(new.at),
            check_out_at: Set(None),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            checkout_latitude: Set(None),
            checkout_longitude: Set(None),
            notes: Set(new.notes),
            created_by: Set(new.created_by),
            created_at: Set(new.at),
            updated_at: Set(new.at),
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

    /// The open campus tap of `user_id` on `date`, if any.
    pub async fn find_open_tap<C>(
        db: &C,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Date.eq(date))
            .filter(Column::ContextKey.eq(OPEN_TAP_CONTEXT))
            .filter(Column::CheckOutAt.is_null())
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Closes an open tap in place.
    ///
    /// Guarded by `check_out_at IS NULL`; returns `false` when another request
    /// closed (or deleted) the tap first. The context key moves from the shared
    /// open slot to `campus:{id}` so a later tap-in the same day can open again.
    pub async fn close_tap<C>(db: &C, id: i64, close: TapClose) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let res = Entity::update_many()
            .col_expr(Column::CheckOutAt, Expr::value(close.at))
            .col_expr(Column::CheckoutLatitude, Expr::value(close.latitude))
            .col_expr(Column::CheckoutLongitude, Expr::value(close.longitude))
            .col_expr(Column::GeofenceId, Expr::value(close.geofence_id))
            .col_expr(
                Column::Kind,
                Expr::value(AttendanceKind::GeofenceTapOut.to_value()),
            )
            .col_expr(Column::ContextKey, Expr::value(format!("campus:{id}")))
            .col_expr(Column::UpdatedAt, Expr::value(close.at))
            .filter(Column::Id.eq(id))
            .filter(Column::CheckOutAt.is_null())
            .filter(Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// Overrides status and/or notes of a live record.
    pub async fn amend<C>(
        db: &C,
        id: i64,
        status: Option<AttendanceStatus>,
        notes: Option<String>,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_live(db, id).await? else {
            return Ok(None);
        };

        let mut active: ActiveModel = model.into();
        if let Some(status) = status {
            active.status = Set(status);
        }
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await.map(Some)
    }

    /// Tombstones a record. The unique index only covers live rows, so the
    /// `(user_id, date, context_key)` slot frees up.
    pub async fn soft_delete<C>(db: &C, id: i64) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let res = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// Live records of one class schedule, oldest first.
    pub async fn find_for_schedule<C>(db: &C, schedule_id: i64) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::ScheduleId.eq(schedule_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_asc(Column::Date)
            .order_by_asc(Column::CheckInAt)
            .all(db)
            .await
    }

    /// Every live record matching `filter`, newest first.
    pub async fn find_matching<C>(db: &C, filter: &AttendanceFilter) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(filter.condition())
            .order_by_desc(Column::Date)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// One page of live records matching `filter`, newest first, plus the
    /// total count.
    pub async fn list<C>(
        db: &C,
        filter: &AttendanceFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Model>, u64), DbErr>
    where
        C: ConnectionTrait,
    {
        let paginator = Entity::find()
            .filter(filter.condition())
            .order_by_desc(Column::Date)
            .order_by_desc(Column::Id)
            .paginate(db, per_page.max(1));

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Live record counts grouped by status, keyed by the stored string.
    pub async fn count_by_status<C>(
        db: &C,
        filter: &AttendanceFilter,
    ) -> Result<Vec<(String, i64)>, DbErr>
    where
        C: ConnectionTrait,
    {
        Self::grouped_counts(db, filter, Column::Status).await
    }

    /// Live record counts grouped by verification kind.
    pub async fn count_by_kind<C>(
        db: &C,
        filter: &AttendanceFilter,
    ) -> Result<Vec<(String, i64)>, DbErr>
    where
        C: ConnectionTrait,
    {
        Self::grouped_counts(db, filter, Column::Kind).await
    }

    async fn grouped_counts<C>(
        db: &C,
        filter: &AttendanceFilter,
        column: Column,
    ) -> Result<Vec<(String, i64)>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows: Vec<CountRow> = Entity::find()
            .select_only()
            .column_as(column, "key")
            .column_as(Expr::expr(Func::count(Expr::col(Column::Id))), "cnt")
            .filter(filter.condition())
            .group_by(column)
            .into_model::<CountRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.key, r.cnt)).collect())
    }
}

impl AttendanceFilter {
    pub(crate) fn condition(&self) -> Condition {
        let mut cond = Condition::all().add(Column::DeletedAt.is_null());
        if let Some(user_id) = self.user_id {
            cond = cond.add(Column::UserId.eq(user_id));
        }
        if let Some(schedule_id) = self.schedule_id {
            cond = cond.add(Column::ScheduleId.eq(schedule_id));
        }
        if let Some(ids) = &self.schedule_ids {
            cond = cond.add(Column::ScheduleId.is_in(ids.iter().copied()));
        }
        if let Some(from) = self.from {
            cond = cond.add(Column::Date.gte(from));
        }
        if let Some(to) = self.to {
            cond = cond.add(Column::Date.lte(to));
        }
        if let Some(status) = self.status {
            cond = cond.add(Column::Status.eq(status));
        }
        cond
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use sea_orm::SqlErr;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()
    }

    fn open_tap(user_id: i64) -> NewAttendanceRecord {
        NewAttendanceRecord {
            user_id,
            date: day(),
            kind: AttendanceKind::GeofenceTapIn,
            status: AttendanceStatus::Present,
            context_key: OPEN_TAP_CONTEXT.into(),
            schedule_id: None,
            session_id: None,
            geofence_id: None,
            at: Utc::now(),
            latitude: Some(0.0),
            longitude: Some(0.0),
            notes: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn duplicate_context_on_same_day_violates_unique_index() {
        let db = setup_test_db().await;
        Model::create(&db, open_tap(1)).await.unwrap();
        let err = Model::create(&db, open_tap(1)).await.unwrap_err();
        assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))));

        // Different person, same slot: fine.
        Model::create(&db, open_tap(2)).await.unwrap();
    }

    #[tokio::test]
    async fn close_tap_applies_once_and_frees_open_slot() {
        let db = setup_test_db().await;
        let rec = Model::create(&db, open_tap(1)).await.unwrap();
        let gate = crate::models::geofence::Model::create(&db, "Gate", 0.0, 0.0, 50.0)
            .await
            .unwrap();
        let close = TapClose {
            at: Utc::now(),
            latitude: 0.0,
            longitude: 0.0,
            geofence_id: gate.id,
        };

        assert!(Model::close_tap(&db, rec.id, close).await.unwrap());
        assert!(!Model::close_tap(&db, rec.id, close).await.unwrap());

        let closed = Model::find_live(&db, rec.id).await.unwrap().unwrap();
        assert_eq!(closed.kind, AttendanceKind::GeofenceTapOut);
        assert_eq!(closed.context_key, format!("campus:{}", rec.id));
        assert!(closed.check_out_at.is_some());
        assert!(Model::find_open_tap(&db, 1, day()).await.unwrap().is_none());

        Model::create(&db, open_tap(1)).await.unwrap();
    }

    #[tokio::test]
    async fn soft_delete_hides_record_and_frees_slot() {
        let db = setup_test_db().await;
        let rec = Model::create(&db, open_tap(1)).await.unwrap();

        assert!(Model::soft_delete(&db, rec.id).await.unwrap());
        assert!(!Model::soft_delete(&db, rec.id).await.unwrap());
        assert!(Model::find_live(&db, rec.id).await.unwrap().is_none());

        let again = Model::create(&db, open_tap(1)).await.unwrap();
        assert_eq!(again.context_key, OPEN_TAP_CONTEXT);
        assert_eq!(
            Model::find_open_tap(&db, 1, day()).await.unwrap().map(|m| m.id),
            Some(again.id)
        );
    }

    #[tokio::test]
    async fn tombstone_keeps_its_key_and_never_blocks_live_rows() {
        let db = setup_test_db().await;
        let manual = |key: &str| NewAttendanceRecord {
            kind: AttendanceKind::Manual,
            context_key: key.into(),
            ..open_tap(1)
        };

        let first = Model::create(&db, manual("manual:x")).await.unwrap();
        assert!(Model::soft_delete(&db, first.id).await.unwrap());

        // Keys that look like rewritten tombstones are ordinary keys.
        let lookalike = format!("manual:x#deleted:{}", first.id);
        Model::create(&db, manual(&lookalike)).await.unwrap();
        Model::create(&db, manual("manual:x")).await.unwrap();

        let tomb = Entity::find_by_id(first.id).one(&db).await.unwrap().unwrap();
        assert_eq!(tomb.context_key, "manual:x");
        assert!(tomb.deleted_at.is_some());
    }

    #[tokio::test]
    async fn grouped_counts_and_paging_respect_filter() {
        let db = setup_test_db().await;
        for (i, status) in [
            AttendanceStatus::Present,
            AttendanceStatus::Present,
            AttendanceStatus::Late,
        ]
        .into_iter()
        .enumerate()
        {
            Model::create(
                &db,
                NewAttendanceRecord {
                    kind: AttendanceKind::Manual,
                    status,
                    context_key: format!("manual:{i}"),
                    ..open_tap(5)
                },
            )
            .await
            .unwrap();
        }
        Model::create(&db, open_tap(6)).await.unwrap();

        let filter = AttendanceFilter::new().with_user_id(5);
        let mut by_status = Model::count_by_status(&db, &filter).await.unwrap();
        by_status.sort();
        assert_eq!(by_status, vec![("late".into(), 1), ("present".into(), 2)]);

        let (page, total) = Model::list(&db, &filter, 1, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].id > page[1].id);
    }

    #[tokio::test]
    async fn schedule_set_filter_matches_members_only() {
        let db = setup_test_db().await;
        for schedule_id in [1, 2, 3] {
            Model::create(
                &db,
                NewAttendanceRecord {
                    kind: AttendanceKind::Qr,
                    context_key: format!("schedule:{schedule_id}"),
                    schedule_id: Some(schedule_id),
                    ..open_tap(8)
                },
            )
            .await
            .unwrap();
        }

        let rows = Model::find_matching(&db, &AttendanceFilter::new().with_schedule_ids(vec![1, 3]))
            .await
            .unwrap();
        let mut ids: Vec<_> = rows.iter().filter_map(|r| r.schedule_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);

        let none = Model::find_matching(&db, &AttendanceFilter::new().with_schedule_ids(vec![]))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
