use crate::seed::Seeder;
use chrono::NaiveTime;
use db::models::shift_pattern;
use sea_orm::{DatabaseConnection, DbErr};
use std::pin::Pin;

pub struct ShiftPatternSeeder;

pub const PATTERNS: [(&str, &str, (u32, u32), (u32, u32), i32); 4] = [
    ("DAY", "Day shift", (8, 0), (16, 0), 10),
    ("EARLY", "Early shift", (6, 0), (14, 0), 5),
    ("LATE", "Late shift", (14, 0), (22, 0), 5),
    ("NIGHT", "Night shift", (22, 0), (6, 0), 15),
];

impl Seeder for ShiftPatternSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            for (code, name, (sh, sm), (eh, em), grace) in PATTERNS {
                let start = NaiveTime::from_hms_opt(sh, sm, 0).unwrap_or_default();
                let end = NaiveTime::from_hms_opt(eh, em, 0).unwrap_or_default();
                shift_pattern::Model::create(db, code, name, start, end, grace).await?;
            }
            Ok(())
        })
    }
}
