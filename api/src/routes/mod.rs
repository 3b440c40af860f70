//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/attendance` → QR sessions, campus taps, manual entries, records and statistics
//! - `/schedules` → Class schedules
//! - `/geofences` → Campus zones
//! - `/work-attendance` → Shift check-in/out, shift patterns, assignments and work schedules
//!
//! Everything except `/health` requires a valid Bearer token. Capability
//! guards are attached per route inside each group.

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    attendance::attendance_routes, geofences::geofences_routes, health::health_routes,
    schedules::schedules_routes, work_attendance::work_attendance_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod attendance;
pub mod common;
pub mod geofences;
pub mod health;
pub mod schedules;
pub mod work_attendance;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/schedules",
            schedules_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/geofences",
            geofences_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest(
            "/work-attendance",
            work_attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
