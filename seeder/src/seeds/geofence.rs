use crate::seed::Seeder;
use db::models::geofence;
use sea_orm::{DatabaseConnection, DbErr};
use std::pin::Pin;

pub struct GeofenceSeeder;

impl Seeder for GeofenceSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            let zones = [
                ("Hatfield main campus", -25.7545, 28.2314, 650.0),
                ("IT building", -25.7560, 28.2336, 80.0),
                ("Engineering 3", -25.7553, 28.2290, 120.0),
                ("Groenkloof campus", -25.7735, 28.2069, 400.0),
            ];

            for (name, lat, lon, radius) in zones {
                geofence::Model::create(db, name, lat, lon, radius).await?;
            }
            Ok(())
        })
    }
}
