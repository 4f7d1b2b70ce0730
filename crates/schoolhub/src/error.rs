//! Error types shared by the store, the timetable core and the HTTP layer.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur while serving a school records request.
#[derive(Debug, Error)]
pub enum SchoolError {
    /// Input is missing, malformed or violates a field-level rule
    #[error("{0}")]
    BadRequest(String),

    /// A referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// The write would duplicate or double-book an existing record
    #[error("{0}")]
    Conflict(String),

    /// The access policy refused the request
    #[error("{0}")]
    Forbidden(String),

    /// The underlying SQLite store failed
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Anything else that should never reach a client as a 4xx
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchoolError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        SchoolError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SchoolError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        SchoolError::Conflict(message.into())
    }

    /// The HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SchoolError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SchoolError::NotFound(_) => StatusCode::NOT_FOUND,
            SchoolError::Conflict(_) => StatusCode::CONFLICT,
            SchoolError::Forbidden(_) => StatusCode::FORBIDDEN,
            SchoolError::Store(_) | SchoolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if the failure is on the server side rather than the caller's input.
    pub fn is_server_error(&self) -> bool {
        matches!(self, SchoolError::Store(_) | SchoolError::Internal(_))
    }
}

impl From<serde_json::Error> for SchoolError {
    fn from(err: serde_json::Error) -> Self {
        SchoolError::Internal(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type SchoolResult<T> = Result<T, SchoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SchoolError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SchoolError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(SchoolError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            SchoolError::Store(rusqlite::Error::QueryReturnedNoRows).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_errors_display_their_message() {
        let err = SchoolError::conflict("Teacher has another class at this time");
        assert_eq!(err.to_string(), "Teacher has another class at this time");
        assert!(!err.is_server_error());
    }
}
