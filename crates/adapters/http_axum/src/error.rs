//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use autohome_domain::error::AutoHomeError;
use autohome_domain::guardrail::DecisionReason;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasons: Option<Vec<DecisionReason>>,
}

/// Maps [`AutoHomeError`] to an HTTP response with appropriate status code.
pub struct ApiError(AutoHomeError);

impl From<AutoHomeError> for ApiError {
    fn from(err: AutoHomeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut reasons = None;
        let (status, message) = match &self.0 {
            AutoHomeError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AutoHomeError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            AutoHomeError::Guardrail(err) => {
                reasons = Some(err.reasons.clone());
                (StatusCode::FORBIDDEN, err.to_string())
            }
            AutoHomeError::Approval(err) => (StatusCode::CONFLICT, err.to_string()),
            AutoHomeError::Dispatch(err) => {
                tracing::error!(error = %err, "device backend failure");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message, reasons })).into_response()
    }
}
