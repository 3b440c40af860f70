use super::LECTURER_IDS;
use crate::seed::Seeder;
use chrono::{Datelike, Duration, NaiveTime, Utc};
use db::models::class_schedule::{self, NewClassSchedule};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use sea_orm::{DatabaseConnection, DbErr};
use std::pin::Pin;

pub struct ClassScheduleSeeder;

const ROOMS: [&str; 6] = ["IT 4-1", "IT 4-4", "EMB 2-150", "Thuto 1-1", "HB 4-8", "Lab 2"];

impl Seeder for ClassScheduleSeeder {
    fn seed<'a>(
        &'a self,
        db: &'a DatabaseConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), DbErr>> + Send + 'a>> {
        Box::pin(async move {
            let mut rng = StdRng::from_entropy();

            // Weekly slots: every lecturer teaches three periods a week.
            for lecturer_id in LECTURER_IDS {
                for _ in 0..3 {
                    let hour = rng.gen_range(7..17);
                    let start = NaiveTime::from_hms_opt(hour, 30, 0).unwrap_or_default();
                    class_schedule::Model::create(
                        db,
                        NewClassSchedule {
                            course_id: rng.gen_range(100..400),
                            lecturer_id,
                            room: ROOMS.choose(&mut rng).map(|r| r.to_string()),
                            date: None,
                            day_of_week: Some(rng.gen_range(1..=5)),
                            start_time: start,
                            end_time: start + Duration::minutes(50),
                        },
                    )
                    .await?;
                }
            }

            // One-off sessions across the coming week.
            let today = Utc::now().date_naive();
            for offset in 0..7 {
                let date = today + Duration::days(offset);
                if date.weekday().number_from_monday() > 5 {
                    continue;
                }
                let start = NaiveTime::from_hms_opt(rng.gen_range(8..16), 0, 0).unwrap_or_default();
                class_schedule::Model::create(
                    db,
                    NewClassSchedule {
                        course_id: 301,
                        lecturer_id: *LECTURER_IDS.choose(&mut rng).unwrap_or(&LECTURER_IDS[0]),
                        room: Some("Lab 2".into()),
                        date: Some(date),
                        day_of_week: None,
                        start_time: start,
                        end_time: start + Duration::minutes(110),
                    },
                )
                .await?;
            }

            // Evening practical that runs past midnight.
            let late = NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default();
            class_schedule::Model::create(
                db,
                NewClassSchedule {
                    course_id: 344,
                    lecturer_id: LECTURER_IDS[0],
                    room: Some("Lab 2".into()),
                    date: None,
                    day_of_week: Some(5),
                    start_time: late,
                    end_time: late + Duration::hours(3),
                },
            )
            .await?;

            Ok(())
        })
    }
}
