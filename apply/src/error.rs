use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Stable kind identifiers carried in error bodies
pub mod error_kind {
    pub const BAD_ROUTE: &str = "bad_route";
    pub const DECODE: &str = "decode";
    pub const VALIDATION: &str = "validation";
    pub const NOT_FOUND: &str = "not_found";
    pub const CONFLICT: &str = "conflict";
    pub const INTERNAL: &str = "internal";
}

/// Errors raised by the management API
///
/// Each variant maps to a kind (see [`error_kind`]) and an HTTP status. The
/// response body is always:
///
/// ```json
/// {"error": "bad route", "kind": "bad_route"}
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// A required path variable was missing. HTTP 400.
    #[error("bad route")]
    BadRoute,

    /// Request or response body could not be decoded. HTTP 400.
    #[error("{0}")]
    Decode(String),

    /// Well-formed input rejected by the service. HTTP 422.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApplyError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApplyError::BadRoute => error_kind::BAD_ROUTE,
            ApplyError::Decode(_) => error_kind::DECODE,
            ApplyError::Validation(_) => error_kind::VALIDATION,
            ApplyError::NotFound(_) => error_kind::NOT_FOUND,
            ApplyError::Conflict(_) => error_kind::CONFLICT,
            ApplyError::Internal(_) => error_kind::INTERNAL,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplyError::BadRoute => StatusCode::BAD_REQUEST,
            ApplyError::Decode(_) => StatusCode::BAD_REQUEST,
            ApplyError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApplyError::NotFound(_) => StatusCode::NOT_FOUND,
            ApplyError::Conflict(_) => StatusCode::CONFLICT,
            ApplyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Rebuild an error from a decoded body; unknown kinds become `Internal`
    pub fn from_kind(kind: &str, message: String) -> Self {
        match kind {
            error_kind::BAD_ROUTE => ApplyError::BadRoute,
            error_kind::DECODE => ApplyError::Decode(message),
            error_kind::VALIDATION => ApplyError::Validation(message),
            error_kind::NOT_FOUND => ApplyError::NotFound(message),
            error_kind::CONFLICT => ApplyError::Conflict(message),
            _ => ApplyError::Internal(message),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
        }
    }
}

/// Wire form of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub kind: String,
}

impl From<ErrorBody> for ApplyError {
    fn from(body: ErrorBody) -> Self {
        ApplyError::from_kind(&body.kind, body.error)
    }
}

impl IntoResponse for ApplyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            debug!(kind = self.kind(), error = %self, "Request rejected");
        }
        (status, axum::Json(self.body())).into_response()
    }
}
