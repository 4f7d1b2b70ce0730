//! School records backend: classes, staff, students, attendance, admissions
//! and conflict-checked timetables, served as a JSON REST API.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod server;
pub mod timetable;
pub mod types;
pub mod validation;
