use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::geofence_admin::GeofenceAdmin;
use util::state::AppState;

use crate::response::{ApiResponse, from_presence_error};

/// GET /api/geofences
///
/// Active zones in the order containment checks visit them.
pub async fn list_geofences(State(state): State<AppState>) -> Response {
    match GeofenceAdmin::list_active(state.db()).await {
        Ok(zones) => (
            StatusCode::OK,
            Json(ApiResponse::success(zones, "Geofences retrieved")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
