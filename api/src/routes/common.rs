use chrono::NaiveDate;
use serde::Deserialize;
use services::geo::Coordinates;
use services::policy::PresencePolicy;
use services::presence_engine::PresenceEngine;
use validator::Validate;

/// Engine configured from the current `AppConfig`.
pub fn engine() -> PresenceEngine {
    PresenceEngine::new(PresencePolicy::from_config())
}

/// Latitude/longitude pair sent by a device.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct LocationReq {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be within -90..=90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be within -180..=180"))]
    pub longitude: f64,
}

impl From<LocationReq> for Coordinates {
    fn from(l: LocationReq) -> Self {
        Coordinates::new(l.latitude, l.longitude)
    }
}

/// Pairs optional coordinates. Both or neither must be present.
pub fn optional_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coordinates>, String> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon))),
        (None, None) => Ok(None),
        _ => Err("latitude and longitude must be given together".into()),
    }
}

/// `?user_id=&start_date=&end_date=` as used by the listing endpoints.
/// `user_id` defaults to the caller.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub user_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
