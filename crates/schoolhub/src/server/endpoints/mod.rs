pub mod academics;
pub mod admissions;
pub mod communication;
pub mod dashboard;
pub mod staff;
pub mod status;
pub mod students;
pub mod timetable;
