pub mod class_schedule;
pub mod geofence;
pub mod shift_pattern;
pub mod user_shift;
pub mod work_schedule;

/// Lecturers owning the seeded class schedules.
pub const LECTURER_IDS: [i64; 3] = [10, 11, 12];

/// Staff members receiving shift assignments and work days.
pub const STAFF_IDS: [i64; 4] = [30, 31, 32, 33];
