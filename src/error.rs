//! Error types with HTTP status code mapping.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::config::Posture;

/// Seconds a client should wait before retrying a 503.
const RETRY_AFTER_SECS: u64 = 5;

/// Error type for roster operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Auth errors
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Access denied: {0}")]
    Forbidden(String),

    // Data errors
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unsupported media type: expected {expected}")]
    UnsupportedMediaType { expected: String },

    // Availability errors
    #[error("Database not ready")]
    NotReady,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // System errors
    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Validation failure for a single request field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::TokenExpired => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,

            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation { .. } | Error::BadRequest(_) | Error::AddrParse(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            Error::NotReady | Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            Error::Config(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Database(_)
            | Error::Jwt(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert error into HTTP response.
    ///
    /// 5xx causes are logged in full. The body only carries them in the
    /// development posture.
    pub fn into_response_for(self, posture: Posture) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let mut body = serde_json::Map::new();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
            body.insert("error".into(), "Internal server error".into());
            if posture == Posture::Development {
                body.insert("details".into(), self.to_string().into());
            }
        } else {
            if status.is_server_error() {
                tracing::warn!(error = %self, "service unavailable");
            }
            body.insert("error".into(), self.to_string().into());
            if let Error::Validation { field, .. } = &self {
                body.insert("field".into(), (*field).into());
            }
        }

        let mut builder = Response::builder()
            .status(status)
            .header("Content-Type", "application/json");
        if status == StatusCode::SERVICE_UNAVAILABLE {
            builder = builder.header("Retry-After", RETRY_AFTER_SECS);
        }
        builder
            .body(Full::new(Bytes::from(
                serde_json::Value::Object(body).to_string(),
            )))
            .unwrap()
    }
}

/// Result type alias using roster's Error.
pub type Result<T> = std::result::Result<T, Error>;
