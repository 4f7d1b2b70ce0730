//! Sections, classes, subjects and subject groups.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::academics::{
    self, ClassUpdate, NewClass, NewSubject, NewSubjectGroup, SubjectUpdate,
};
use crate::db::SubjectType;
use crate::error::SchoolResult;
use crate::server::types::{created, done, fail, ok};
use crate::server::util::{require, ApiJson};
use crate::types::AppState;
use crate::validation::{optional_list, optional_text, parse_choice, FieldCheck};

// --- sections -------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBody {
    name: Option<String>,
}

impl SectionBody {
    fn name(&self) -> SchoolResult<String> {
        let mut check = FieldCheck::new();
        let name = check.text("name", &self.name);
        check.finish()?;
        Ok(name)
    }
}

/// POST /api/sections
pub async fn post_section(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SectionBody>,
) -> Response {
    info!("POST /api/sections");

    let result = body
        .name()
        .and_then(|name| s.db.write(|c| academics::create_section(c, &name)));
    match result {
        Ok(section) => created("Section created", section),
        Err(e) => fail("Failed to create section", e),
    }
}

/// GET /api/sections
pub async fn get_sections(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/sections");

    match s.db.read(academics::list_sections) {
        Ok(sections) => ok(sections),
        Err(e) => fail("Failed to list sections", e),
    }
}

/// GET /api/sections/:id
pub async fn get_section(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/sections/{}", id);

    match require(s.db.read(|c| academics::get_section(c, &id)), "Section not found") {
        Ok(section) => ok(section),
        Err(e) => fail("Failed to fetch section", e),
    }
}

/// PUT /api/sections/:id
pub async fn put_section(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SectionBody>,
) -> Response {
    info!("PUT /api/sections/{}", id);

    let result = body
        .name()
        .and_then(|name| s.db.write(|c| academics::update_section(c, &id, &name)));
    match result {
        Ok(section) => ok(section),
        Err(e) => fail("Failed to update section", e),
    }
}

/// DELETE /api/sections/:id
pub async fn delete_section(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/sections/{}", id);

    match s.db.write(|c| academics::delete_section(c, &id)) {
        Ok(()) => done("Section deleted"),
        Err(e) => fail("Failed to delete section", e),
    }
}

// --- classes --------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassBody {
    name: Option<String>,
    section_ids: Option<Vec<String>>,
}

/// POST /api/classes
pub async fn post_class(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ClassBody>,
) -> Response {
    info!("POST /api/classes");

    let mut check = FieldCheck::new();
    let new = NewClass {
        name: check.text("name", &body.name),
        section_ids: optional_list(&body.section_ids),
    };
    let result = check
        .finish()
        .and_then(|_| s.db.write(|c| academics::create_class(c, &new)));
    match result {
        Ok(class) => created("Class created", class),
        Err(e) => fail("Failed to create class", e),
    }
}

/// GET /api/classes
pub async fn get_classes(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/classes");

    match s.db.read(academics::list_classes) {
        Ok(classes) => ok(classes),
        Err(e) => fail("Failed to list classes", e),
    }
}

/// GET /api/classes/:id
pub async fn get_class(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/classes/{}", id);

    match require(s.db.read(|c| academics::get_class(c, &id)), "Class not found") {
        Ok(class) => ok(class),
        Err(e) => fail("Failed to fetch class", e),
    }
}

/// PUT /api/classes/:id
pub async fn put_class(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ClassBody>,
) -> Response {
    info!("PUT /api/classes/{}", id);

    let update = ClassUpdate {
        name: optional_text(&body.name),
        section_ids: body.section_ids.as_ref().map(|_| optional_list(&body.section_ids)),
    };
    match s.db.write(|c| academics::update_class(c, &id, &update)) {
        Ok(class) => ok(class),
        Err(e) => fail("Failed to update class", e),
    }
}

/// DELETE /api/classes/:id
pub async fn delete_class(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/classes/{}", id);

    match s.db.write(|c| academics::delete_class(c, &id)) {
        Ok(()) => done("Class deleted"),
        Err(e) => fail("Failed to delete class", e),
    }
}

// --- subjects -------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBody {
    name: Option<String>,
    code: Option<String>,
    #[serde(rename = "type")]
    subject_type: Option<String>,
}

impl SubjectBody {
    fn subject_type(&self) -> SchoolResult<Option<SubjectType>> {
        optional_text(&self.subject_type)
            .map(|t| parse_choice("type", &t))
            .transpose()
    }

    fn into_new(self) -> SchoolResult<NewSubject> {
        let mut check = FieldCheck::new();
        let name = check.text("name", &self.name);
        check.finish()?;
        Ok(NewSubject {
            name,
            code: optional_text(&self.code).map(|c| c.to_uppercase()),
            subject_type: self.subject_type()?.unwrap_or(SubjectType::Theory),
        })
    }

    fn into_update(self) -> SchoolResult<SubjectUpdate> {
        Ok(SubjectUpdate {
            subject_type: self.subject_type()?,
            name: optional_text(&self.name),
            code: optional_text(&self.code).map(|c| c.to_uppercase()),
        })
    }
}

/// POST /api/subjects
pub async fn post_subject(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SubjectBody>,
) -> Response {
    info!("POST /api/subjects");

    let result = body
        .into_new()
        .and_then(|new| s.db.write(|c| academics::create_subject(c, &new)));
    match result {
        Ok(subject) => created("Subject created", subject),
        Err(e) => fail("Failed to create subject", e),
    }
}

/// GET /api/subjects
pub async fn get_subjects(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/subjects");

    match s.db.read(academics::list_subjects) {
        Ok(subjects) => ok(subjects),
        Err(e) => fail("Failed to list subjects", e),
    }
}

/// GET /api/subjects/:id
pub async fn get_subject(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/subjects/{}", id);

    match require(s.db.read(|c| academics::get_subject(c, &id)), "Subject not found") {
        Ok(subject) => ok(subject),
        Err(e) => fail("Failed to fetch subject", e),
    }
}

/// PUT /api/subjects/:id
pub async fn put_subject(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SubjectBody>,
) -> Response {
    info!("PUT /api/subjects/{}", id);

    let result = body
        .into_update()
        .and_then(|update| s.db.write(|c| academics::update_subject(c, &id, &update)));
    match result {
        Ok(subject) => ok(subject),
        Err(e) => fail("Failed to update subject", e),
    }
}

/// DELETE /api/subjects/:id
pub async fn delete_subject(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/subjects/{}", id);

    match s.db.write(|c| academics::delete_subject(c, &id)) {
        Ok(()) => done("Subject deleted"),
        Err(e) => fail("Failed to delete subject", e),
    }
}

// --- subject groups -------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGroupBody {
    name: Option<String>,
    class_id: Option<String>,
    section_ids: Option<Vec<String>>,
    subject_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGroupQuery {
    class_id: Option<String>,
}

/// POST /api/subject-groups
pub async fn post_subject_group(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SubjectGroupBody>,
) -> Response {
    info!("POST /api/subject-groups");

    let mut check = FieldCheck::new();
    let new = NewSubjectGroup {
        name: check.text("name", &body.name),
        class_id: check.text("classId", &body.class_id),
        section_ids: check.list("sectionIds", &body.section_ids),
        subject_ids: check.list("subjectIds", &body.subject_ids),
    };
    let result = check
        .finish()
        .and_then(|_| s.db.write(|c| academics::create_subject_group(c, &new)));
    match result {
        Ok(group) => created("Subject group created", group),
        Err(e) => fail("Failed to create subject group", e),
    }
}

/// GET /api/subject-groups
pub async fn get_subject_groups(
    State(s): State<Arc<AppState>>,
    Query(query): Query<SubjectGroupQuery>,
) -> Response {
    info!("GET /api/subject-groups");

    let class_id = optional_text(&query.class_id);
    match s
        .db
        .read(|c| academics::list_subject_groups(c, class_id.as_deref()))
    {
        Ok(groups) => ok(groups),
        Err(e) => fail("Failed to list subject groups", e),
    }
}

/// GET /api/subject-groups/:id
pub async fn get_subject_group(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/subject-groups/{}", id);

    match require(
        s.db.read(|c| academics::get_subject_group(c, &id)),
        "Subject Group not found",
    ) {
        Ok(group) => ok(group),
        Err(e) => fail("Failed to fetch subject group", e),
    }
}

/// DELETE /api/subject-groups/:id
pub async fn delete_subject_group(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /api/subject-groups/{}", id);

    match s.db.write(|c| academics::delete_subject_group(c, &id)) {
        Ok(()) => done("Subject group deleted"),
        Err(e) => fail("Failed to delete subject group", e),
    }
}
