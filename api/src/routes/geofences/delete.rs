use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::geofence_admin::GeofenceAdmin;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error};

/// DELETE /api/geofences/{geofence_id}
pub async fn delete_geofence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(geofence_id): Path<i64>,
) -> Response {
    match GeofenceAdmin::delete(state.db(), &user.actor(), geofence_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Geofence deleted")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
