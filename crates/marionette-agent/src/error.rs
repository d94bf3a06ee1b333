//! Response shaping: the public error model.
//!
//! Adapter errors never cross the HTTP boundary raw. They are classified
//! into the three public kinds here; anything that still escapes a handler
//! is caught by the panic-trap middleware in `server`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use marionette::AutomationError;
use serde::de::DeserializeOwned;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request: bad JSON, missing/empty required fields,
    /// out-of-range values.
    Validation(String),
    /// Request body over the per-route size cap.
    PayloadTooLarge(String),
    /// The request was well-formed but named something that does not exist:
    /// a stale path, a query with no matches, an unknown app.
    Resolution(String),
    /// The OS call itself failed.
    Adapter(String),
}

impl From<AutomationError> for ApiError {
    fn from(err: AutomationError) -> Self {
        match &err {
            AutomationError::InvalidArgument(msg) => ApiError::Validation(msg.clone()),
            _ if err.is_resolution_failure() => ApiError::Resolution(err.to_string()),
            _ => ApiError::Adapter(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message, "code": 400 })),
            )
                .into_response(),
            ApiError::PayloadTooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "error": message, "code": 413 })),
            )
                .into_response(),
            ApiError::Resolution(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            ApiError::Adapter(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` extractor whose rejection matches the documented validation
/// shape instead of axum's default plain-text body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::PayloadTooLarge(rejection.body_text()))
            }
            Err(rejection) => Err(match &rejection {
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                    ApiError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
                }
                _ => ApiError::Validation(rejection.body_text()),
            }),
        }
    }
}
