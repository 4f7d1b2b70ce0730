use axum::extract::{Path, Query, State};
use axum::Extension;
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::timetable::TimetableFilter;
use crate::db::Weekday;
use crate::error::SchoolResult;
use crate::server::middleware::auth::AuthContext;
use crate::server::types::{created, done, fail, ok};
use crate::server::util::ApiJson;
use crate::timetable::{self, CreateTimetableEntry};
use crate::types::AppState;
use crate::validation::{optional_text, parse_choice};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableQuery {
    class_id: Option<String>,
    section_id: Option<String>,
    teacher_id: Option<String>,
    day: Option<String>,
}

impl TimetableQuery {
    fn into_filter(self) -> SchoolResult<TimetableFilter> {
        let day = match optional_text(&self.day) {
            Some(day) => Some(parse_choice::<Weekday>("day", &day)?),
            None => None,
        };
        Ok(TimetableFilter {
            class_id: optional_text(&self.class_id),
            section_id: optional_text(&self.section_id),
            teacher_id: optional_text(&self.teacher_id),
            day,
        })
    }
}

/// POST /api/timetables
pub async fn post_timetable(
    State(s): State<Arc<AppState>>,
    Extension(caller): Extension<AuthContext>,
    ApiJson(body): ApiJson<CreateTimetableEntry>,
) -> Response {
    info!("POST /api/timetables by {}", caller.caller());

    match timetable::create_entry(&s.db, &body) {
        Ok(entry) => created("Timetable entry created", entry),
        Err(e) => fail("Failed to create timetable entry", e),
    }
}

/// GET /api/timetables
pub async fn get_timetables(
    State(s): State<Arc<AppState>>,
    Query(query): Query<TimetableQuery>,
) -> Response {
    info!("GET /api/timetables");

    match query
        .into_filter()
        .and_then(|filter| timetable::list_entries(&s.db, &filter))
    {
        Ok(entries) => ok(entries),
        Err(e) => fail("Failed to list timetable entries", e),
    }
}

/// GET /api/timetables/:id
pub async fn get_timetable(Path(id): Path<String>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/timetables/{}", id);

    match timetable::get_entry(&s.db, &id) {
        Ok(entry) => ok(entry),
        Err(e) => fail("Failed to fetch timetable entry", e),
    }
}

/// DELETE /api/timetables/:id
pub async fn delete_timetable(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
    Extension(caller): Extension<AuthContext>,
) -> Response {
    info!("DELETE /api/timetables/{} by {}", id, caller.caller());

    match timetable::delete_entry(&s.db, &id) {
        Ok(()) => done("Timetable entry deleted"),
        Err(e) => fail("Failed to delete timetable entry", e),
    }
}

/// GET /api/timetables/class/:class_id/section/:section_id
pub async fn get_class_schedule(
    Path((class_id, section_id)): Path<(String, String)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /api/timetables/class/{}/section/{}", class_id, section_id);

    match timetable::class_schedule(&s.db, &class_id, &section_id) {
        Ok(days) => ok(days),
        Err(e) => fail("Failed to fetch class schedule", e),
    }
}

/// GET /api/timetables/teacher/:teacher_id
pub async fn get_teacher_schedule(
    Path(teacher_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /api/timetables/teacher/{}", teacher_id);

    match timetable::teacher_schedule(&s.db, &teacher_id) {
        Ok(days) => ok(days),
        Err(e) => fail("Failed to fetch teacher schedule", e),
    }
}
