use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510010001_create_class_schedules::Migration),
            Box::new(migrations::m202510010002_create_geofences::Migration),
            Box::new(migrations::m202510010003_create_attendance_sessions::Migration),
            Box::new(migrations::m202510010004_create_attendance_records::Migration),
            Box::new(migrations::m202510010005_create_shift_patterns::Migration),
            Box::new(migrations::m202510010006_create_user_shifts::Migration),
            Box::new(migrations::m202510010007_create_work_schedules::Migration),
            Box::new(migrations::m202510010008_create_work_attendance_records::Migration),
        ]
    }
}
