use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use tracing::error;

use crate::server::types::ApiErrorType;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Turns a panic in any inner handler into a 500 failure envelope.
pub async fn catch_panic(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            error!(
                "Handler panicked on {} {}: {}",
                method,
                path,
                panic_message(payload.as_ref())
            );
            ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                Some("Unexpected server failure".to_string()),
            ))
            .into_response()
        }
    }
}
