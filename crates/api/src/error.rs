use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use q8_core::compose::ExecError;
use q8_core::error::CoreError;
use serde_json::json;

use crate::orchestration::OrchestrationError;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses
/// of the form `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `q8_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed tenant lifecycle operation.
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    /// A request body that could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Orchestration(OrchestrationError::Invalid(core)) => {
                classify_core_error(core)
            }
            // Orchestration diagnostics go back verbatim; the control plane
            // needs the captured command output.
            AppError::Orchestration(err) => {
                tracing::error!(error = %err, "Tenant operation failed");
                let code = match err.exec_error() {
                    Some(ExecError::Timeout { .. }) => "COMMAND_TIMEOUT",
                    Some(ExecError::Cancelled) => "COMMAND_CANCELLED",
                    _ => "ORCHESTRATION_FAILED",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
    }
}
