//! Great-circle distance and circular zone containment.

use db::models::geofence;
use serde::{Deserialize, Serialize};

use crate::error::PresenceError;

/// Mean Earth radius used for every distance in the system.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Rejects non-finite or out-of-range degrees.
    pub fn validate(&self) -> Result<(), PresenceError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(PresenceError::Validation(format!(
                "invalid coordinates ({}, {})",
                self.latitude, self.longitude
            )))
        }
    }
}

/// Haversine distance in meters between two points given in degrees.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

pub fn contains(zone: &geofence::Model, point: Coordinates) -> bool {
    distance_meters(Coordinates::new(zone.latitude, zone.longitude), point) <= zone.radius_meters
}

/// No active zone contains the point. Carries the names of the zones checked.
#[derive(Debug, Clone, PartialEq)]
pub struct NotInAnyZone {
    pub checked: Vec<String>,
}

/// First active zone, by ascending id, whose circle contains `point`.
///
/// Overlapping zones resolve to the lowest id.
pub fn locate(
    point: Coordinates,
    zones: &[geofence::Model],
) -> Result<&geofence::Model, NotInAnyZone> {
    let mut active: Vec<&geofence::Model> = zones
        .iter()
        .filter(|z| z.is_active && z.deleted_at.is_none())
        .collect();
    active.sort_by_key(|z| z.id);

    match active.iter().find(|z| contains(z, point)) {
        Some(zone) => Ok(*zone),
        None => Err(NotInAnyZone {
            checked: active.iter().map(|z| z.name.clone()).collect(),
        }),
    }
}

impl NotInAnyZone {
    pub fn into_error(self, point: Coordinates) -> PresenceError {
        PresenceError::OutsideGeofence {
            latitude: point.latitude,
            longitude: point.longitude,
            checked: self.checked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn zone(id: i64, name: &str, lat: f64, lon: f64, radius: f64) -> geofence::Model {
        let now = Utc::now();
        geofence::Model {
            id,
            name: name.into(),
            latitude: lat,
            longitude: lon,
            radius_meters: radius,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// A point `meters` due north of the equator/prime-meridian origin.
    fn north_of_origin(meters: f64) -> Coordinates {
        Coordinates::new((meters / EARTH_RADIUS_METERS).to_degrees(), 0.0)
    }

    #[test]
    fn distance_is_zero_for_same_point_and_symmetric() {
        let a = Coordinates::new(-6.2, 106.8);
        let b = Coordinates::new(51.5, -0.12);
        assert_eq!(distance_meters(a, a), 0.0);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn known_distance_is_close() {
        // One degree of latitude on this sphere.
        let d = distance_meters(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn boundary_99_inside_101_outside() {
        let zones = vec![zone(1, "Quad", 0.0, 0.0, 100.0)];

        assert_eq!(locate(north_of_origin(99.0), &zones).unwrap().id, 1);

        let miss = locate(north_of_origin(101.0), &zones).unwrap_err();
        assert_eq!(miss.checked, vec!["Quad".to_string()]);
    }

    #[test]
    fn overlap_resolves_to_lowest_id_regardless_of_input_order() {
        let zones = vec![
            zone(9, "Hall", 0.0, 0.0, 500.0),
            zone(3, "Library", 0.0, 0.0, 500.0),
        ];
        assert_eq!(locate(north_of_origin(10.0), &zones).unwrap().name, "Library");
    }

    #[test]
    fn inactive_zones_are_skipped() {
        let mut off = zone(1, "Closed", 0.0, 0.0, 500.0);
        off.is_active = false;
        let zones = vec![off];

        let miss = locate(north_of_origin(1.0), &zones).unwrap_err();
        assert!(miss.checked.is_empty());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, f64::NAN).validate().is_err());
        assert!(Coordinates::new(-90.0, 180.0).validate().is_ok());
    }
}
