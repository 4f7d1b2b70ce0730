use axum::response::Response;
use serde_json::json;
use tracing::info;

use crate::server::types::ok;

/// GET /health
pub async fn get_health() -> Response {
    info!("GET /health");
    ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
