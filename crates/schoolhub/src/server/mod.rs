use std::sync::Arc;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{middleware as mw, Router};
use tracing::info;

use crate::server::endpoints::{
    academics, admissions, communication, dashboard, staff, status, students, timetable,
};
use crate::server::middleware::{auth, panic, request_id};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

mod endpoints;
pub mod middleware;
mod types;
mod util;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let timetable_router = Router::new()
        .route(
            "/timetables",
            post(timetable::post_timetable).get(timetable::get_timetables),
        )
        .route(
            "/timetables/:id",
            get(timetable::get_timetable).delete(timetable::delete_timetable),
        )
        .route(
            "/timetables/class/:class_id/section/:section_id",
            get(timetable::get_class_schedule),
        )
        .route(
            "/timetables/teacher/:teacher_id",
            get(timetable::get_teacher_schedule),
        );

    let academics_router = Router::new()
        .route(
            "/sections",
            post(academics::post_section).get(academics::get_sections),
        )
        .route(
            "/sections/:id",
            get(academics::get_section)
                .put(academics::put_section)
                .delete(academics::delete_section),
        )
        .route(
            "/classes",
            post(academics::post_class).get(academics::get_classes),
        )
        .route(
            "/classes/:id",
            get(academics::get_class)
                .put(academics::put_class)
                .delete(academics::delete_class),
        )
        .route(
            "/subjects",
            post(academics::post_subject).get(academics::get_subjects),
        )
        .route(
            "/subjects/:id",
            get(academics::get_subject)
                .put(academics::put_subject)
                .delete(academics::delete_subject),
        )
        .route(
            "/subject-groups",
            post(academics::post_subject_group).get(academics::get_subject_groups),
        )
        .route(
            "/subject-groups/:id",
            get(academics::get_subject_group).delete(academics::delete_subject_group),
        );

    let staff_router = Router::new()
        .route("/staff", post(staff::post_staff).get(staff::get_staff_list))
        .route(
            "/staff/:id",
            get(staff::get_staff)
                .put(staff::put_staff)
                .delete(staff::delete_staff),
        )
        .route(
            "/teacher-assignments",
            post(staff::post_assignment).get(staff::get_assignments),
        )
        .route(
            "/teacher-assignments/:id",
            put(staff::put_assignment).delete(staff::delete_assignment),
        )
        .route(
            "/teacher-assignments/class/:class_id/section/:section_id",
            get(staff::get_assignment_for),
        );

    let students_router = Router::new()
        .route(
            "/students",
            post(students::post_student).get(students::get_students),
        )
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::put_student)
                .delete(students::delete_student),
        )
        .route("/attendance", get(students::get_attendance))
        .route("/attendance/bulk", post(students::post_bulk_attendance))
        .route(
            "/attendance/student/:student_id/summary",
            get(students::get_attendance_summary),
        );

    let communication_router = Router::new()
        .route(
            "/notices",
            post(communication::post_notice).get(communication::get_notices),
        )
        .route(
            "/notices/:id",
            get(communication::get_notice)
                .put(communication::put_notice)
                .delete(communication::delete_notice),
        )
        .route(
            "/complaints",
            post(communication::post_complaint).get(communication::get_complaints),
        )
        .route(
            "/complaints/:id",
            get(communication::get_complaint).delete(communication::delete_complaint),
        )
        .route(
            "/complaints/:id/status",
            put(communication::put_complaint_status),
        );

    let admissions_router = Router::new()
        .route(
            "/admissions/applications",
            post(admissions::post_application).get(admissions::get_applications),
        )
        .route(
            "/admissions/applications/:id",
            get(admissions::get_application).delete(admissions::delete_application),
        )
        .route(
            "/admissions/applications/:id/status",
            put(admissions::put_application_status),
        )
        .route(
            "/admissions/applications/:id/exam",
            put(admissions::put_application_exam),
        )
        .route(
            "/admissions/applications/:id/details",
            get(admissions::get_application_details),
        );

    let api_router = Router::new()
        .merge(timetable_router)
        .merge(academics_router)
        .merge(staff_router)
        .merge(students_router)
        .merge(communication_router)
        .merge(admissions_router)
        .route("/dashboard/summary", get(dashboard::get_summary))
        .layer(mw::from_fn_with_state(app_state.clone(), auth::authorize));

    let router = Router::new()
        .route("/health", get(status::get_health))
        .nest("/api", api_router);
    with_guards(router).with_state(app_state)
}

/// Adds the JSON 404 fallback, panic recovery and request-id tracing to `router`.
pub fn with_guards<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .fallback(not_found)
        .layer(mw::from_fn(panic::catch_panic))
        .layer(mw::from_fn(request_id::trace_request))
}

async fn not_found(uri: Uri) -> Response {
    info!("No route for {}", uri.path());
    ApiErrorType::from((StatusCode::NOT_FOUND, "Route not found", None)).into_response()
}
