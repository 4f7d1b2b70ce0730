use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{SchoolError, SchoolResult};
use crate::server::types::ApiErrorType;

/// Turns a lookup that found nothing into a 404 with `message`.
pub fn require<T>(found: SchoolResult<Option<T>>, message: &str) -> SchoolResult<T> {
    found?.ok_or_else(|| SchoolError::not_found(message))
}

/// Like [`Json`], but a body that fails to parse is answered in the error envelope.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiErrorType;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Invalid JSON body",
                Some(rejection.body_text()),
            ))),
        }
    }
}
