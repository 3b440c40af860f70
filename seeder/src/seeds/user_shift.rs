use super::STAFF_IDS;
use crate::seed::Seeder;
use chrono::{Datelike, NaiveDate, Utc};
use db::models::{shift_pattern, user_shift};
use sea_orm::{DatabaseConnection, DbErr};
use std::pin::Pin;

pub struct UserShiftSeeder;

impl Seeder for UserShiftSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            let patterns = shift_pattern::Model::list(db, true).await?;
            if patterns.is_empty() {
                return Err(DbErr::Custom("no shift patterns to assign".into()));
            }

            let year = Utc::now().year();
            let jan = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default();
            let jul = NaiveDate::from_ymd_opt(year, 7, 1).unwrap_or_default();

            // Staff rotate to the next pattern halfway through the year.
            for (i, user_id) in STAFF_IDS.into_iter().enumerate() {
                let first = &patterns[i % patterns.len()];
                let second = &patterns[(i + 1) % patterns.len()];
                user_shift::Model::create(db, user_id, first.id, jan, jul.pred_opt()).await?;
                user_shift::Model::create(db, user_id, second.id, jul, None).await?;
            }
            Ok(())
        })
    }
}
