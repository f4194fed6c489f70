//! API error taxonomy and HTTP envelope rendering.
//!
//! Every failure that crosses the request boundary is one of these variants;
//! handlers return `Result<_, ApiError>` and the `IntoResponse` impl maps the
//! variant to a status code plus the `{success: false, error, message?}`
//! JSON envelope the frontend expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown agent, action, or user id.
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed required fields, unsupported command type.
    #[error("{0}")]
    Validation(String),

    /// A trade violates the agent's configured limits.
    #[error("{0}")]
    PolicyViolation(String),

    /// Missing/invalid/expired token, bad credentials, or ownership mismatch.
    #[error("{0}")]
    Auth(AuthError),

    /// Duplicate resource (email already registered or in use).
    #[error("{0}")]
    Conflict(String),

    /// The blockchain collaborator call failed or timed out.
    #[error("{0}")]
    Execution(String),

    /// Server-side misconfiguration surfaced at runtime.
    #[error("{0}")]
    Config(String),

    /// Anything unclassified; rendered as a generic 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access denied")]
    AccessDenied,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PolicyViolation(_) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::MissingToken) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidToken) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::AccessDenied) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("API error: {:?}", self);
        }

        // Internal detail stays in the logs in release builds.
        let message = match &self {
            ApiError::Internal(_) if !cfg!(debug_assertions) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
