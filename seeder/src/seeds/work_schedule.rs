use super::STAFF_IDS;
use crate::seed::Seeder;
use chrono::{Datelike, Duration, Utc};
use db::models::{shift_pattern, user_shift};
use db::models::work_schedule::{self, NewWorkSchedule};
use sea_orm::{DatabaseConnection, DbErr};
use std::pin::Pin;

pub struct WorkScheduleSeeder;

impl Seeder for WorkScheduleSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            let today = Utc::now().date_naive();

            // Two weeks of weekdays, timed from each user's effective pattern.
            for user_id in STAFF_IDS {
                for offset in -7..7 {
                    let date = today + Duration::days(offset);
                    if date.weekday().number_from_monday() > 5 {
                        continue;
                    }
                    let Some(assignment) =
                        user_shift::Model::effective_on(db, user_id, date).await?
                    else {
                        continue;
                    };
                    let Some(pattern) =
                        shift_pattern::Model::find_live(db, assignment.shift_pattern_id).await?
                    else {
                        continue;
                    };

                    work_schedule::Model::create(
                        db,
                        NewWorkSchedule {
                            user_id,
                            shift_pattern_id: Some(assignment.shift_pattern_id),
                            date,
                            start_time: pattern.start_time,
                            end_time: pattern.end_time,
                            grace_minutes: pattern.grace_minutes,
                            notes: None,
                        },
                    )
                    .await?;
                }
            }
            Ok(())
        })
    }
}
