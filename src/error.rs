// Error taxonomy for the session service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::credentials::CredentialError;

/// Failures surfaced by the session registry and its HTTP adapters.
///
/// Expired, superseded and profile-mismatch outcomes are not errors; they are
/// reported through [`crate::session::SessionCheck`] instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A required field was missing or blank
    #[error("{0}")]
    Validation(String),

    /// Unknown identity or wrong secret (deliberately indistinguishable)
    #[error("invalid identity or secret")]
    InvalidCredentials,

    /// Missing or wrong privileged key on an administrative call
    #[error("admin access required")]
    Unauthorized,

    /// Anything unexpected, e.g. the credential store could not be read
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn missing_fields(fields: &[&str]) -> Self {
        SessionError::Validation(format!("{} required", fields.join(", ")))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            SessionError::Unauthorized => StatusCode::FORBIDDEN,
            SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CredentialError> for SessionError {
    fn from(err: CredentialError) -> Self {
        SessionError::Internal(err.to_string())
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let msg = match &self {
            SessionError::Internal(detail) => {
                error!("Internal error while handling request: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status_code(), Json(json!({ "ok": false, "msg": msg }))).into_response()
    }
}
