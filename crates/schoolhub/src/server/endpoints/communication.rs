//! Notices and complaints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::communication::{self, NewComplaint, NewNotice, NoticeUpdate};
use crate::db::{ComplaintStatus, NoticeAudience};
use crate::error::SchoolResult;
use crate::server::types::{created, done, fail, ok};
use crate::server::util::{require, ApiJson};
use crate::types::AppState;
use crate::validation::{optional_text, parse_choice, parse_date, FieldCheck};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeBody {
    title: Option<String>,
    body: Option<String>,
    audience: Option<String>,
    published_on: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    audience: Option<String>,
}

fn parse_audience(audience: &Option<String>) -> SchoolResult<Option<NoticeAudience>> {
    optional_text(audience)
        .map(|a| parse_choice("audience", &a))
        .transpose()
}

impl NoticeBody {
    fn into_update(self) -> SchoolResult<NoticeUpdate> {
        Ok(NoticeUpdate {
            title: optional_text(&self.title),
            body: optional_text(&self.body),
            audience: parse_audience(&self.audience)?,
            published_on: optional_text(&self.published_on)
                .map(|d| parse_date("publishedOn", &d))
                .transpose()?,
        })
    }

    fn into_new(self) -> SchoolResult<NewNotice> {
        let mut check = FieldCheck::new();
        let title = check.text("title", &self.title);
        let body = check.text("body", &self.body);
        check.finish()?;

        let update = self.into_update()?;
        Ok(NewNotice {
            title,
            body,
            audience: update.audience.unwrap_or(NoticeAudience::All),
            published_on: update
                .published_on
                .unwrap_or_else(|| Local::now().date_naive()),
        })
    }
}

/// POST /api/notices
pub async fn post_notice(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NoticeBody>,
) -> Response {
    info!("POST /api/notices");

    let result = body
        .into_new()
        .and_then(|new| s.db.write(|c| communication::create_notice(c, &new)));
    match result {
        Ok(notice) => created("Notice published", notice),
        Err(e) => fail("Failed to publish notice", e),
    }
}

/// GET /api/notices
pub async fn get_notices(
    State(s): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    info!("GET /api/notices");

    let result = parse_audience(&query.audience)
        .and_then(|audience| s.db.read(|c| communication::list_notices(c, audience)));
    match result {
        Ok(notices) => ok(notices),
        Err(e) => fail("Failed to list notices", e),
    }
}

/// GET /api/notices/:id
pub async fn get_notice(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/notices/{}", id);

    match require(s.db.read(|c| communication::get_notice(c, &id)), "Notice not found") {
        Ok(notice) => ok(notice),
        Err(e) => fail("Failed to fetch notice", e),
    }
}

/// PUT /api/notices/:id
pub async fn put_notice(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NoticeBody>,
) -> Response {
    info!("PUT /api/notices/{}", id);

    let result = body
        .into_update()
        .and_then(|update| s.db.write(|c| communication::update_notice(c, &id, &update)));
    match result {
        Ok(notice) => ok(notice),
        Err(e) => fail("Failed to update notice", e),
    }
}

/// DELETE /api/notices/:id
pub async fn delete_notice(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/notices/{}", id);

    match s.db.write(|c| communication::delete_notice(c, &id)) {
        Ok(()) => done("Notice deleted"),
        Err(e) => fail("Failed to delete notice", e),
    }
}

// --- complaints -----------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintBody {
    raised_by: Option<String>,
    subject: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusBody {
    status: Option<String>,
}

fn parse_status(status: &Option<String>) -> SchoolResult<Option<ComplaintStatus>> {
    optional_text(status)
        .map(|st| parse_choice("status", &st))
        .transpose()
}

/// POST /api/complaints
pub async fn post_complaint(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ComplaintBody>,
) -> Response {
    info!("POST /api/complaints");

    let mut check = FieldCheck::new();
    let new = NewComplaint {
        raised_by: check.text("raisedBy", &body.raised_by),
        subject: check.text("subject", &body.subject),
        description: check.text("description", &body.description),
    };
    let result = check
        .finish()
        .and_then(|_| s.db.write(|c| communication::create_complaint(c, &new)));
    match result {
        Ok(complaint) => created("Complaint registered", complaint),
        Err(e) => fail("Failed to register complaint", e),
    }
}

/// GET /api/complaints
pub async fn get_complaints(
    State(s): State<Arc<AppState>>,
    Query(query): Query<StatusBody>,
) -> Response {
    info!("GET /api/complaints");

    let result = parse_status(&query.status)
        .and_then(|status| s.db.read(|c| communication::list_complaints(c, status)));
    match result {
        Ok(complaints) => ok(complaints),
        Err(e) => fail("Failed to list complaints", e),
    }
}

/// GET /api/complaints/:id
pub async fn get_complaint(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/complaints/{}", id);

    match require(
        s.db.read(|c| communication::get_complaint(c, &id)),
        "Complaint not found",
    ) {
        Ok(complaint) => ok(complaint),
        Err(e) => fail("Failed to fetch complaint", e),
    }
}

/// PUT /api/complaints/:id/status
pub async fn put_complaint_status(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Response {
    info!("PUT /api/complaints/{}/status", id);

    let mut check = FieldCheck::new();
    let status = check.text("status", &body.status);
    let result = check
        .finish()
        .and_then(|_| parse_choice::<ComplaintStatus>("status", &status))
        .and_then(|status| s.db.write(|c| communication::set_complaint_status(c, &id, status)));
    match result {
        Ok(complaint) => ok(complaint),
        Err(e) => fail("Failed to update complaint status", e),
    }
}

/// DELETE /api/complaints/:id
pub async fn delete_complaint(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/complaints/{}", id);

    match s.db.write(|c| communication::delete_complaint(c, &id)) {
        Ok(()) => done("Complaint deleted"),
        Err(e) => fail("Failed to delete complaint", e),
    }
}
