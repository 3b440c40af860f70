//! Lifecycle of classroom QR sessions.

use chrono::{DateTime, Duration, Utc};
use db::models::attendance_session;
use rand::RngCore;
use rand::rngs::OsRng;
use sea_orm::{ConnectionTrait, DatabaseTransaction, TransactionTrait};

use crate::error::{PresenceError, is_unique_violation};
use crate::schedule_catalog::ScheduleCatalog;

/// 32 bytes from the OS RNG, hex-encoded (64 chars).
pub fn generate_token() -> String {
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

pub struct SessionRegistry;

impl SessionRegistry {
    /// Opens a new session for `schedule_id`, superseding any active one.
    ///
    /// Authorization is the caller's job. The deactivate and the insert share
    /// one transaction, rolled back on any failure or when the request is
    /// dropped midway.
    pub async fn open_session<C>(
        db: &C,
        schedule_id: i64,
        created_by: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<attendance_session::Model, PresenceError>
    where
        C: TransactionTrait,
    {
        if ttl <= Duration::zero() {
            return Err(PresenceError::Validation("session ttl must be positive".into()));
        }

        let txn = db.begin().await?;
        let outcome = Self::supersede_and_insert(&txn, schedule_id, created_by, ttl, now).await;
        let (session, superseded) = match outcome {
            Ok(done) => done,
            Err(e) => {
                txn.rollback().await?;
                return Err(e);
            }
        };
        txn.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                PresenceError::ConcurrentSessionIssue(schedule_id)
            } else {
                PresenceError::Database(e)
            }
        })?;

        tracing::info!(
            schedule_id,
            session_id = session.id,
            superseded,
            expires_at = %session.expires_at,
            "attendance session opened"
        );
        Ok(session)
    }

    async fn supersede_and_insert(
        txn: &DatabaseTransaction,
        schedule_id: i64,
        created_by: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(attendance_session::Model, u64), PresenceError> {
        let schedule = ScheduleCatalog::schedule_by_id(txn, schedule_id).await?;
        if !schedule.is_active {
            return Err(PresenceError::ScheduleInactive(schedule_id));
        }

        let superseded =
            attendance_session::Model::deactivate_for_schedule(txn, schedule_id, now).await?;

        let session = attendance_session::Model::create(
            txn,
            schedule_id,
            created_by,
            &generate_token(),
            now + ttl,
            now,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PresenceError::ConcurrentSessionIssue(schedule_id)
            } else {
                PresenceError::Database(e)
            }
        })?;

        Ok((session, superseded))
    }

    /// The active, unexpired session of a schedule.
    pub async fn resolve_active<C>(
        db: &C,
        schedule_id: i64,
        now: DateTime<Utc>,
    ) -> Result<attendance_session::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        match attendance_session::Model::find_active_for_schedule(db, schedule_id).await? {
            Some(session) if !session.is_expired(now) => Ok(session),
            _ => Err(PresenceError::NoActiveSession(schedule_id)),
        }
    }

    /// The session behind `token`, only while it is active and unexpired.
    pub async fn resolve_by_token<C>(
        db: &C,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<attendance_session::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        let session = attendance_session::Model::find_by_token(db, token.trim())
            .await?
            .ok_or_else(|| PresenceError::SessionExpiredOrInvalid {
                reason: "unknown token".into(),
            })?;

        if !session.active {
            return Err(PresenceError::SessionExpiredOrInvalid {
                reason: format!("session {} was superseded", session.id),
            });
        }
        if session.is_expired(now) {
            return Err(PresenceError::SessionExpiredOrInvalid {
                reason: format!("session {} expired at {}", session.id, session.expires_at.to_rfc3339()),
            });
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use db::models::class_schedule::{self, ClassScheduleChanges, NewClassSchedule};
    use db::test_utils::setup_test_db;
    use futures::future::join_all;
    use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

    async fn schedule(db: &DatabaseConnection) -> class_schedule::Model {
        class_schedule::Model::create(
            db,
            NewClassSchedule {
                course_id: 1,
                lecturer_id: 10,
                room: None,
                date: None,
                day_of_week: Some(1),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn tokens_are_64_hex_chars_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn reopening_supersedes_previous_token() {
        let db = setup_test_db().await;
        let s = schedule(&db).await;
        let now = Utc::now();

        let first = SessionRegistry::open_session(&db, s.id, 10, Duration::minutes(5), now)
            .await
            .unwrap();
        let second = SessionRegistry::open_session(&db, s.id, 10, Duration::minutes(5), now)
            .await
            .unwrap();

        let err = SessionRegistry::resolve_by_token(&db, &first.token, now)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("superseded"), "{err}");

        let ok = SessionRegistry::resolve_by_token(&db, &second.token, now)
            .await
            .unwrap();
        assert_eq!(ok.id, second.id);
        assert_eq!(
            SessionRegistry::resolve_active(&db, s.id, now).await.unwrap().id,
            second.id
        );
    }

    #[tokio::test]
    async fn concurrent_issues_leave_one_active_session() {
        let db = setup_test_db().await;
        let s = schedule(&db).await;
        let now = Utc::now();

        let results = join_all(
            (0..6).map(|_| SessionRegistry::open_session(&db, s.id, 10, Duration::minutes(5), now)),
        )
        .await;
        assert!(results.iter().any(|r| r.is_ok()));
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, PresenceError::ConcurrentSessionIssue(_)))
        );

        let active = attendance_session::Entity::find()
            .filter(attendance_session::Column::ScheduleId.eq(s.id))
            .filter(attendance_session::Column::Active.eq(true))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let mut live = Vec::new();
        for session in results.into_iter().flatten() {
            if SessionRegistry::resolve_by_token(&db, &session.token, now).await.is_ok() {
                live.push(session.id);
            }
        }
        assert_eq!(live, vec![active[0].id]);
    }

    #[tokio::test]
    async fn expired_and_unknown_tokens_are_invalid() {
        let db = setup_test_db().await;
        let s = schedule(&db).await;
        let now = Utc::now();
        let session = SessionRegistry::open_session(&db, s.id, 10, Duration::seconds(60), now)
            .await
            .unwrap();

        let later = now + Duration::seconds(60);
        let err = SessionRegistry::resolve_by_token(&db, &session.token, later)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Invalid);
        assert!(err.to_string().contains("expired at"), "{err}");
        assert!(matches!(
            SessionRegistry::resolve_active(&db, s.id, later).await,
            Err(PresenceError::NoActiveSession(_))
        ));

        let err = SessionRegistry::resolve_by_token(&db, "nope", now).await.unwrap_err();
        assert!(err.to_string().contains("unknown token"));
    }

    #[tokio::test]
    async fn inactive_or_missing_schedule_cannot_open() {
        let db = setup_test_db().await;
        let s = schedule(&db).await;
        class_schedule::Model::apply_changes(
            &db,
            s.id,
            ClassScheduleChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            SessionRegistry::open_session(&db, s.id, 10, Duration::minutes(5), Utc::now()).await,
            Err(PresenceError::ScheduleInactive(_))
        ));
        assert!(matches!(
            SessionRegistry::open_session(&db, 999, 10, Duration::minutes(5), Utc::now()).await,
            Err(PresenceError::ScheduleNotFound(999))
        ));
    }
}
