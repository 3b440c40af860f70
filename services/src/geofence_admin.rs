use db::models::geofence;
use sea_orm::ConnectionTrait;

use crate::capability::{Actor, Capability};
use crate::error::PresenceError;
use crate::geo::Coordinates;

/// Largest radius a campus zone may have, in meters.
pub const MAX_RADIUS_METERS: f64 = 50_000.0;

pub struct GeofenceAdmin;

impl GeofenceAdmin {
    pub async fn create<C>(
        db: &C,
        actor: &Actor,
        name: &str,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<geofence::Model, PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageGeofences)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(PresenceError::Validation("geofence name is required".into()));
        }
        center.validate()?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 || radius_meters > MAX_RADIUS_METERS {
            return Err(PresenceError::Validation(format!(
                "radius_meters must be in (0, {MAX_RADIUS_METERS}], got {radius_meters}"
            )));
        }

        let zone =
            geofence::Model::create(db, name, center.latitude, center.longitude, radius_meters)
                .await?;
        tracing::info!(geofence_id = zone.id, name = %zone.name, actor_id = actor.id, "geofence created");
        Ok(zone)
    }

    pub async fn list_active<C>(db: &C) -> Result<Vec<geofence::Model>, PresenceError>
    where
        C: ConnectionTrait,
    {
        Ok(geofence::Model::find_active(db).await?)
    }

    pub async fn delete<C>(db: &C, actor: &Actor, id: i64) -> Result<(), PresenceError>
    where
        C: ConnectionTrait,
    {
        actor.require(Capability::ManageGeofences)?;

        if geofence::Model::soft_delete(db, id).await? {
            tracing::info!(geofence_id = id, actor_id = actor.id, "geofence deleted");
            Ok(())
        } else {
            Err(PresenceError::GeofenceNotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Role;
    use crate::error::ErrorKind;
    use db::test_utils::setup_test_db;

    const STAFF: Actor = Actor { id: 1, role: Role::Staff };

    #[tokio::test]
    async fn create_validates_and_delete_hides_zone() {
        let db = setup_test_db().await;
        let center = Coordinates::new(-25.7545, 28.2314);

        let err = GeofenceAdmin::create(&db, &Actor::new(9, Role::Lecturer), "Main", center, 100.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        for radius in [0.0, -5.0, f64::NAN] {
            let err = GeofenceAdmin::create(&db, &STAFF, "Main", center, radius)
                .await
                .unwrap_err();
            assert!(matches!(err, PresenceError::Validation(_)));
        }
        let err = GeofenceAdmin::create(&db, &STAFF, "Bad", Coordinates::new(91.0, 0.0), 10.0)
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::Validation(_)));

        let zone = GeofenceAdmin::create(&db, &STAFF, " Main ", center, 100.0).await.unwrap();
        assert_eq!(zone.name, "Main");
        assert_eq!(GeofenceAdmin::list_active(&db).await.unwrap().len(), 1);

        GeofenceAdmin::delete(&db, &STAFF, zone.id).await.unwrap();
        assert!(GeofenceAdmin::list_active(&db).await.unwrap().is_empty());
        assert!(matches!(
            GeofenceAdmin::delete(&db, &STAFF, zone.id).await,
            Err(PresenceError::GeofenceNotFound(_))
        ));
    }
}
