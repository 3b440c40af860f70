pub mod attendance_record;
pub mod attendance_session;
pub mod class_schedule;
pub mod geofence;
pub mod shift_pattern;
pub mod user_shift;
pub mod work_attendance_record;
pub mod work_schedule;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use class_schedule::Entity as ClassSchedule;
pub use geofence::Entity as Geofence;
pub use shift_pattern::Entity as ShiftPattern;
pub use user_shift::Entity as UserShift;
pub use work_attendance_record::Entity as WorkAttendanceRecord;
pub use work_schedule::Entity as WorkSchedule;
