//! Admission applications and entrance exams.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::admissions::{self, ExamRecord, NewApplication, DEFAULT_MAX_SCORE};
use crate::db::ApplicationStatus;
use crate::error::SchoolResult;
use crate::server::types::{created, done, fail, ok};
use crate::server::util::{require, ApiJson};
use crate::types::AppState;
use crate::validation::{optional_text, parse_choice, parse_date, FieldCheck};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationBody {
    applicant_name: Option<String>,
    date_of_birth: Option<String>,
    applying_for_class_id: Option<String>,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
}

impl ApplicationBody {
    fn into_new(self) -> SchoolResult<NewApplication> {
        let mut check = FieldCheck::new();
        let applicant_name = check.text("applicantName", &self.applicant_name);
        let applying_for_class_id = check.text("applyingForClassId", &self.applying_for_class_id);
        let guardian_name = check.text("guardianName", &self.guardian_name);
        let guardian_phone = check.text("guardianPhone", &self.guardian_phone);
        check.finish()?;

        Ok(NewApplication {
            applicant_name,
            date_of_birth: optional_text(&self.date_of_birth)
                .map(|d| parse_date("dateOfBirth", &d))
                .transpose()?,
            applying_for_class_id,
            guardian_name,
            guardian_phone,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusBody {
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamBody {
    exam_date: Option<String>,
    score: Option<f64>,
    max_score: Option<f64>,
    remarks: Option<String>,
}

impl ExamBody {
    fn into_record(self) -> SchoolResult<ExamRecord> {
        let mut check = FieldCheck::new();
        let exam_date = check.text("examDate", &self.exam_date);
        check.finish()?;

        Ok(ExamRecord {
            exam_date: parse_date("examDate", &exam_date)?,
            score: self.score,
            max_score: self.max_score.unwrap_or(DEFAULT_MAX_SCORE),
            remarks: optional_text(&self.remarks),
        })
    }
}

/// POST /api/admissions/applications
pub async fn post_application(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ApplicationBody>,
) -> Response {
    info!("POST /api/admissions/applications");

    let today = Local::now().date_naive();
    let result = body
        .into_new()
        .and_then(|new| s.db.write(|c| admissions::create_application(c, &new, today)));
    match result {
        Ok(application) => created("Application submitted", application),
        Err(e) => fail("Failed to submit application", e),
    }
}

/// GET /api/admissions/applications
pub async fn get_applications(
    State(s): State<Arc<AppState>>,
    Query(query): Query<StatusBody>,
) -> Response {
    info!("GET /api/admissions/applications");

    let result = optional_text(&query.status)
        .map(|st| parse_choice::<ApplicationStatus>("status", &st))
        .transpose()
        .and_then(|status| s.db.read(|c| admissions::list_applications(c, status)));
    match result {
        Ok(applications) => ok(applications),
        Err(e) => fail("Failed to list applications", e),
    }
}

/// GET /api/admissions/applications/:id
pub async fn get_application(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/admissions/applications/{}", id);

    match require(
        s.db.read(|c| admissions::get_application(c, &id)),
        "Application not found",
    ) {
        Ok(application) => ok(application),
        Err(e) => fail("Failed to fetch application", e),
    }
}

/// PUT /api/admissions/applications/:id/status
pub async fn put_application_status(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Response {
    info!("PUT /api/admissions/applications/{}/status", id);

    let mut check = FieldCheck::new();
    let status = check.text("status", &body.status);
    let result = check
        .finish()
        .and_then(|_| parse_choice::<ApplicationStatus>("status", &status))
        .and_then(|status| s.db.write(|c| admissions::set_application_status(c, &id, status)));
    match result {
        Ok(application) => ok(application),
        Err(e) => fail("Failed to update application status", e),
    }
}

/// PUT /api/admissions/applications/:id/exam
pub async fn put_application_exam(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ExamBody>,
) -> Response {
    info!("PUT /api/admissions/applications/{}/exam", id);

    let result = body
        .into_record()
        .and_then(|exam| s.db.write(|c| admissions::record_exam(c, &id, &exam)));
    match result {
        Ok(details) => ok(details),
        Err(e) => fail("Failed to record admission exam", e),
    }
}

/// GET /api/admissions/applications/:id/details
pub async fn get_application_details(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /api/admissions/applications/{}/details", id);

    match s.db.read(|c| admissions::application_details(c, &id)) {
        Ok(details) => ok(details),
        Err(e) => fail("Failed to fetch application details", e),
    }
}

/// DELETE /api/admissions/applications/:id
pub async fn delete_application(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/admissions/applications/{}", id);

    match s.db.write(|c| admissions::delete_application(c, &id)) {
        Ok(()) => done("Application deleted"),
        Err(e) => fail("Failed to delete application", e),
    }
}
