use migration::{Migrator, MigratorTrait};

use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    class_schedule::ClassScheduleSeeder, geofence::GeofenceSeeder,
    shift_pattern::ShiftPatternSeeder, user_shift::UserShiftSeeder,
    work_schedule::WorkScheduleSeeder,
};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let config = util::config::AppConfig::global().clone();
    if let Err(e) = common::logger::init_logger(&config.log_level, "logs/seeder.log") {
        eprintln!("Failed to initialise logger: {e}");
    }

    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to connect to {}: {e}", config.database_path);
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        log::error!("Failed to apply migrations: {e}");
        std::process::exit(1);
    }

    // Shift patterns come before the assignments and work days that reference them.
    for (seeder, name) in [
        (Box::new(GeofenceSeeder) as Box<dyn Seeder + Send + Sync>, "Geofence"),
        (Box::new(ClassScheduleSeeder), "ClassSchedule"),
        (Box::new(ShiftPatternSeeder), "ShiftPattern"),
        (Box::new(UserShiftSeeder), "UserShift"),
        (Box::new(WorkScheduleSeeder), "WorkSchedule"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
