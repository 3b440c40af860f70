#![allow(dead_code)]

use api::{auth::generate_jwt, routes::routes};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, FixedOffset, Utc};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::{capability::Role, policy::PresencePolicy};
use tower::ServiceExt;
use util::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// Router over a fresh, migrated in-memory database.
pub async fn make_test_app() -> TestApp {
    let db = setup_test_db().await;
    let router = Router::new().nest("/api", routes(AppState::new(db.clone())));
    TestApp { router, db }
}

pub fn token(user_id: i64, role: Role) -> String {
    generate_jwt(user_id, role).unwrap().0
}

/// The current instant on the campus clock the handlers use.
pub fn campus_now() -> DateTime<FixedOffset> {
    PresencePolicy::from_config().local(Utc::now())
}

impl TestApp {
    /// Sends one request and returns the status with the parsed JSON body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
