//! Students and attendance.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::students::{self, BulkAttendance, NewStudent, StudentFilter, StudentUpdate};
use crate::db::AttendanceStatus;
use crate::error::{SchoolError, SchoolResult};
use crate::server::types::{created, done, fail, ok};
use crate::server::util::{require, ApiJson};
use crate::types::AppState;
use crate::validation::{optional_text, parse_choice, parse_date, FieldCheck};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBody {
    admission_no: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    class_id: Option<String>,
    section_id: Option<String>,
    roll_number: Option<String>,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    class_id: Option<String>,
    section_id: Option<String>,
}

/// POST /api/students
pub async fn post_student(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<StudentBody>,
) -> Response {
    info!("POST /api/students");

    let mut check = FieldCheck::new();
    let new = NewStudent {
        admission_no: check.text("admissionNo", &body.admission_no),
        first_name: check.text("firstName", &body.first_name),
        last_name: check.text("lastName", &body.last_name),
        class_id: check.text("classId", &body.class_id),
        section_id: check.text("sectionId", &body.section_id),
        roll_number: optional_text(&body.roll_number),
        guardian_name: optional_text(&body.guardian_name),
        guardian_phone: optional_text(&body.guardian_phone),
    };
    let result = check
        .finish()
        .and_then(|_| s.db.write(|c| students::create_student(c, &new)));
    match result {
        Ok(student) => created("Student created", student),
        Err(e) => fail("Failed to create student", e),
    }
}

/// GET /api/students
pub async fn get_students(
    State(s): State<Arc<AppState>>,
    Query(query): Query<StudentQuery>,
) -> Response {
    info!("GET /api/students");

    let filter = StudentFilter {
        class_id: optional_text(&query.class_id),
        section_id: optional_text(&query.section_id),
    };
    match s.db.read(|c| students::list_students(c, &filter)) {
        Ok(list) => ok(list),
        Err(e) => fail("Failed to list students", e),
    }
}

/// GET /api/students/:id
pub async fn get_student(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/students/{}", id);

    match require(s.db.read(|c| students::get_student(c, &id)), "Student not found") {
        Ok(student) => ok(student),
        Err(e) => fail("Failed to fetch student", e),
    }
}

/// PUT /api/students/:id
pub async fn put_student(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<StudentBody>,
) -> Response {
    info!("PUT /api/students/{}", id);

    let update = StudentUpdate {
        first_name: optional_text(&body.first_name),
        last_name: optional_text(&body.last_name),
        class_id: optional_text(&body.class_id),
        section_id: optional_text(&body.section_id),
        roll_number: optional_text(&body.roll_number),
        guardian_name: optional_text(&body.guardian_name),
        guardian_phone: optional_text(&body.guardian_phone),
    };
    match s.db.write(|c| students::update_student(c, &id, &update)) {
        Ok(student) => ok(student),
        Err(e) => fail("Failed to update student", e),
    }
}

/// DELETE /api/students/:id
pub async fn delete_student(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/students/{}", id);

    match s.db.write(|c| students::delete_student(c, &id)) {
        Ok(()) => done("Student deleted"),
        Err(e) => fail("Failed to delete student", e),
    }
}

// --- attendance -----------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    student_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceBody {
    class_id: Option<String>,
    section_id: Option<String>,
    date: Option<String>,
    records: Option<Vec<AttendanceMark>>,
}

impl BulkAttendanceBody {
    fn into_bulk(self) -> SchoolResult<BulkAttendance> {
        let mut check = FieldCheck::new();
        let class_id = check.text("classId", &self.class_id);
        let section_id = check.text("sectionId", &self.section_id);
        let date = check.text("date", &self.date);
        let marks = self.records.unwrap_or_default();
        if marks.is_empty() {
            check.text("records", &None);
        }
        check.finish()?;

        let mut records = Vec::with_capacity(marks.len());
        for mark in marks {
            let (Some(student_id), Some(status)) =
                (optional_text(&mark.student_id), optional_text(&mark.status))
            else {
                return Err(SchoolError::bad_request(
                    "Each attendance record needs a studentId and a status",
                ));
            };
            records.push((student_id, parse_choice::<AttendanceStatus>("status", &status)?));
        }

        Ok(BulkAttendance {
            class_id,
            section_id,
            date: parse_date("date", &date)?,
            records,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    class_id: Option<String>,
    section_id: Option<String>,
    date: Option<String>,
}

/// POST /api/attendance/bulk
pub async fn post_bulk_attendance(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<BulkAttendanceBody>,
) -> Response {
    info!("POST /api/attendance/bulk");

    let result = body
        .into_bulk()
        .and_then(|bulk| s.db.write(|c| students::mark_attendance(c, &bulk)));
    match result {
        Ok(records) => created("Attendance recorded", records),
        Err(e) => fail("Failed to record attendance", e),
    }
}

/// GET /api/attendance?classId&sectionId&date
pub async fn get_attendance(
    State(s): State<Arc<AppState>>,
    Query(query): Query<AttendanceQuery>,
) -> Response {
    info!("GET /api/attendance");

    let mut check = FieldCheck::new();
    let class_id = check.text("classId", &query.class_id);
    let section_id = check.text("sectionId", &query.section_id);
    let date = check.text("date", &query.date);
    let result = check
        .finish()
        .and_then(|_| parse_date("date", &date))
        .and_then(|date| s.db.read(|c| students::list_attendance(c, &class_id, &section_id, date)));
    match result {
        Ok(records) => ok(records),
        Err(e) => fail("Failed to list attendance", e),
    }
}

/// GET /api/attendance/student/:student_id/summary
pub async fn get_attendance_summary(
    Path(student_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /api/attendance/student/{}/summary", student_id);

    match s.db.read(|c| students::student_attendance_summary(c, &student_id)) {
        Ok(summary) => ok(summary),
        Err(e) => fail("Failed to summarize attendance", e),
    }
}
