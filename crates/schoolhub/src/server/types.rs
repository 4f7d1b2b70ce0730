use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::SchoolError;

/// The JSON shape of every response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::data(data)
        }
    }
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope::data(data))).into_response()
}

/// 201 with a message and the created record.
pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope::with_message(message, data))).into_response()
}

/// 200 with only a message, e.g. after a delete.
pub fn done(message: &str) -> Response {
    let body: Envelope<()> = Envelope {
        success: true,
        message: Some(message.to_string()),
        data: None,
        error: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// An error response: a status code plus the failure envelope.
#[derive(Debug)]
pub struct ApiErrorType {
    pub status: StatusCode,
    pub message: String,
    pub error: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, message, error): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            message: message.to_string(),
            error,
        }
    }
}

impl From<SchoolError> for ApiErrorType {
    fn from(err: SchoolError) -> Self {
        let status = err.status_code();
        if err.is_server_error() {
            Self::from((status, "Internal server error", Some(err.to_string())))
        } else {
            Self::from((status, err.to_string().as_str(), None))
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        let body: Envelope<()> = Envelope {
            success: false,
            message: Some(self.message),
            data: None,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Logs a failed operation and turns it into its error response.
pub fn fail(context: &str, err: SchoolError) -> Response {
    if err.is_server_error() {
        error!("{}: {}", context, err);
    } else {
        warn!("{}: {}", context, err);
    }
    ApiErrorType::from(err).into_response()
}
