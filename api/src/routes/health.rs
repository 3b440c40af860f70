use crate::response::ApiResponse;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use util::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
}

/// Builds the `/health` route group.
///
/// A single `GET /health` endpoint reporting whether the API and its database
/// are reachable. Useful for uptime checks behind a load balancer.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /health
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "ok", "database": true },
///   "message": "Health check passed"
/// }
/// ```
///
/// A failing database still answers `200` with `database: false` and
/// `status: "degraded"`.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db().execute_unprepared("SELECT 1").await.is_ok();
    let status = if database { "ok" } else { "degraded" };
    let message = if database {
        "Health check passed"
    } else {
        "Database unreachable"
    };
    Json(ApiResponse::success(HealthStatus { status, database }, message))
}
