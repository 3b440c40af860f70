use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use services::geo::Coordinates;
use services::geofence_admin::GeofenceAdmin;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::{ApiResponse, from_presence_error, validation_failed};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGeofenceReq {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

/// POST /api/geofences
///
/// ### Request Body
/// ```json
/// { "name": "Main campus", "latitude": -25.7545, "longitude": 28.2314, "radius_meters": 450 }
/// ```
///
/// ### Responses
/// - `201 Created` with the zone
/// - `422 Unprocessable Entity` for invalid coordinates or a non-positive radius
pub async fn create_geofence(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateGeofenceReq>,
) -> Response {
    if let Err(e) = body.validate() {
        return validation_failed(&e).into_response();
    }

    match GeofenceAdmin::create(
        state.db(),
        &user.actor(),
        &body.name,
        Coordinates::new(body.latitude, body.longitude),
        body.radius_meters,
    )
    .await
    {
        Ok(zone) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(zone, "Geofence created")),
        )
            .into_response(),
        Err(e) => from_presence_error(e).into_response(),
    }
}
