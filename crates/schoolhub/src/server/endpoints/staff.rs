//! Staff members and teacher assignments.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::staff::{self, AssignmentUpdate, NewStaff, NewTeacherAssignment, StaffUpdate};
use crate::db::StaffRole;
use crate::error::SchoolResult;
use crate::server::types::{created, done, fail, ok};
use crate::server::util::{require, ApiJson};
use crate::types::AppState;
use crate::validation::{optional_list, optional_text, parse_choice, FieldCheck};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffBody {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StaffQuery {
    role: Option<String>,
}

fn parse_role(role: &Option<String>) -> SchoolResult<Option<StaffRole>> {
    optional_text(role).map(|r| parse_choice("role", &r)).transpose()
}

impl StaffBody {
    fn into_new(self) -> SchoolResult<NewStaff> {
        let mut check = FieldCheck::new();
        let first_name = check.text("firstName", &self.first_name);
        let last_name = check.text("lastName", &self.last_name);
        let email = check.text("email", &self.email);
        check.finish()?;

        Ok(NewStaff {
            first_name,
            last_name,
            email,
            phone: optional_text(&self.phone),
            role: parse_role(&self.role)?.unwrap_or(StaffRole::Teacher),
        })
    }

    fn into_update(self) -> SchoolResult<StaffUpdate> {
        Ok(StaffUpdate {
            role: parse_role(&self.role)?,
            first_name: optional_text(&self.first_name),
            last_name: optional_text(&self.last_name),
            email: optional_text(&self.email),
            phone: optional_text(&self.phone),
        })
    }
}

/// POST /api/staff
pub async fn post_staff(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<StaffBody>,
) -> Response {
    info!("POST /api/staff");

    let result = body
        .into_new()
        .and_then(|new| s.db.write(|c| staff::create_staff(c, &new)));
    match result {
        Ok(member) => created("Staff member created", member),
        Err(e) => fail("Failed to create staff member", e),
    }
}

/// GET /api/staff
pub async fn get_staff_list(
    State(s): State<Arc<AppState>>,
    Query(query): Query<StaffQuery>,
) -> Response {
    info!("GET /api/staff");

    let result = parse_role(&query.role).and_then(|role| s.db.read(|c| staff::list_staff(c, role)));
    match result {
        Ok(members) => ok(members),
        Err(e) => fail("Failed to list staff", e),
    }
}

/// GET /api/staff/:id
pub async fn get_staff(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/staff/{}", id);

    match require(s.db.read(|c| staff::get_staff(c, &id)), "Staff member not found") {
        Ok(member) => ok(member),
        Err(e) => fail("Failed to fetch staff member", e),
    }
}

/// PUT /api/staff/:id
pub async fn put_staff(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<StaffBody>,
) -> Response {
    info!("PUT /api/staff/{}", id);

    let result = body
        .into_update()
        .and_then(|update| s.db.write(|c| staff::update_staff(c, &id, &update)));
    match result {
        Ok(member) => ok(member),
        Err(e) => fail("Failed to update staff member", e),
    }
}

/// DELETE /api/staff/:id
pub async fn delete_staff(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/staff/{}", id);

    match s.db.write(|c| staff::delete_staff(c, &id)) {
        Ok(()) => done("Staff member deleted"),
        Err(e) => fail("Failed to delete staff member", e),
    }
}

// --- teacher assignments --------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentBody {
    class_id: Option<String>,
    section_id: Option<String>,
    teacher_ids: Option<Vec<String>>,
    class_teacher_id: Option<String>,
}

/// POST /api/teacher-assignments
pub async fn post_assignment(
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AssignmentBody>,
) -> Response {
    info!("POST /api/teacher-assignments");

    let mut check = FieldCheck::new();
    let new = NewTeacherAssignment {
        class_id: check.text("classId", &body.class_id),
        section_id: check.text("sectionId", &body.section_id),
        teacher_ids: check.list("teacherIds", &body.teacher_ids),
        class_teacher_id: check.text("classTeacherId", &body.class_teacher_id),
    };
    let result = check
        .finish()
        .and_then(|_| s.db.write(|c| staff::create_assignment(c, &new)));
    match result {
        Ok(assignment) => created("Teachers assigned", assignment),
        Err(e) => fail("Failed to assign teachers", e),
    }
}

/// GET /api/teacher-assignments
pub async fn get_assignments(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/teacher-assignments");

    match s.db.read(staff::list_assignments) {
        Ok(assignments) => ok(assignments),
        Err(e) => fail("Failed to list teacher assignments", e),
    }
}

/// GET /api/teacher-assignments/class/:class_id/section/:section_id
pub async fn get_assignment_for(
    Path((class_id, section_id)): Path<(String, String)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!(
        "GET /api/teacher-assignments/class/{}/section/{}",
        class_id, section_id
    );

    match require(
        s.db.read(|c| staff::find_assignment_for(c, &class_id, &section_id)),
        "No teachers assigned to this class & section",
    ) {
        Ok(assignment) => ok(assignment),
        Err(e) => fail("Failed to fetch teacher assignment", e),
    }
}

/// PUT /api/teacher-assignments/:id
pub async fn put_assignment(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AssignmentBody>,
) -> Response {
    info!("PUT /api/teacher-assignments/{}", id);

    let update = AssignmentUpdate {
        teacher_ids: body.teacher_ids.as_ref().map(|_| optional_list(&body.teacher_ids)),
        class_teacher_id: optional_text(&body.class_teacher_id),
    };
    match s.db.write(|c| staff::update_assignment(c, &id, &update)) {
        Ok(assignment) => ok(assignment),
        Err(e) => fail("Failed to update teacher assignment", e),
    }
}

/// DELETE /api/teacher-assignments/:id
pub async fn delete_assignment(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /api/teacher-assignments/{}", id);

    match s.db.write(|c| staff::delete_assignment(c, &id)) {
        Ok(()) => done("Teacher assignment deleted"),
        Err(e) => fail("Failed to delete teacher assignment", e),
    }
}
