use axum::extract::State;
use axum::response::Response;
use chrono::Local;
use std::sync::Arc;
use tracing::info;

use crate::db::dashboard;
use crate::server::types::{fail, ok};
use crate::types::AppState;

/// GET /api/dashboard/summary
pub async fn get_summary(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /api/dashboard/summary");

    let today = Local::now().date_naive();
    match s.db.read(|c| dashboard::summary(c, today)) {
        Ok(summary) => ok(summary),
        Err(e) => fail("Failed to build dashboard summary", e),
    }
}
