//! Error types for carousel-dl
//!
//! This module provides error handling for the library, including:
//! - The download error taxonomy (duplicate in-flight key, HTTP status,
//!   content type, persistence, malformed intent)
//! - HTTP status code mapping for the REST surface
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for carousel-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for carousel-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Another operation with the same (resource, filename) key is in flight
    #[error("already downloading {filename}")]
    AlreadyInProgress {
        /// Resource identifier of the rejected request (URL or batch digest)
        resource: String,
        /// Target filename of the rejected request
        filename: String,
    },

    /// Remote server answered with a non-2xx status
    #[error("HTTP error {code} {reason}")]
    HttpStatus {
        /// Numeric status code
        code: u16,
        /// Canonical reason phrase (may be empty)
        reason: String,
    },

    /// Payload is not an image
    #[error("not a valid image file, content type is {0:?}")]
    InvalidContentType(String),

    /// The persistence sink could not create a save target
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    /// Inbound message has no recognizable shape
    #[error("unrecognized request")]
    Unrecognized,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "registry.stale_after")
        key: Option<String>,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// ZIP serialization error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Whether this error means "the same download is already running"
    pub fn is_already_in_progress(&self) -> bool {
        matches!(self, Error::AlreadyInProgress { .. })
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "already_in_progress",
///     "message": "already downloading cat.png"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_content_type")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::Unrecognized => 400,
            Error::AlreadyInProgress { .. } => 409,

            Error::InvalidContentType(_) => 422,

            Error::Io(_) => 500,
            Error::Archive(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::PersistenceFailed(_) => 500,

            // Remote side misbehaved
            Error::HttpStatus { .. } => 502,
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::AlreadyInProgress { .. } => "already_in_progress",
            Error::HttpStatus { .. } => "http_status",
            Error::InvalidContentType(_) => "invalid_content_type",
            Error::PersistenceFailed(_) => "persistence_failed",
            Error::Unrecognized => "unrecognized_request",
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        match &error {
            Error::AlreadyInProgress { resource, filename } => ApiError::with_details(
                code,
                message,
                serde_json::json!({
                    "resource": resource,
                    "filename": filename,
                }),
            ),
            Error::HttpStatus { code: status, reason } => ApiError::with_details(
                code,
                message,
                serde_json::json!({
                    "status": status,
                    "reason": reason,
                }),
            ),
            Error::Config { key: Some(key), .. } => {
                ApiError::with_details(code, message, serde_json::json!({ "key": key }))
            }
            _ => ApiError::new(code, message),
        }
    }
}
