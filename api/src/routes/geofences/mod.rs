use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use util::state::AppState;

mod delete;
mod get;
mod post;

pub use delete::delete_geofence;
pub use get::list_geofences;
pub use post::create_geofence;

use crate::auth::guards::require_manage_geofences;

/// Builds the `/geofences` route group. Expects an authenticated caller.
pub fn geofences_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_geofences))
        .route("/", post(create_geofence).route_layer(from_fn(require_manage_geofences)))
        .route(
            "/{geofence_id}",
            delete(delete_geofence).route_layer(from_fn(require_manage_geofences)),
        )
}
