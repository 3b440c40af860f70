pub mod m202510010001_create_class_schedules;
pub mod m202510010002_create_geofences;
pub mod m202510010003_create_attendance_sessions;
pub mod m202510010004_create_attendance_records;
pub mod m202510010005_create_shift_patterns;
pub mod m202510010006_create_user_shifts;
pub mod m202510010007_create_work_schedules;
pub mod m202510010008_create_work_attendance_records;
