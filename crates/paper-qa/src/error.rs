//! Error types for the paper QA service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classification shared by every pipeline stage.
///
/// The HTTP layer maps errors to status codes from this classification only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Paper could not be fetched (unknown id, network failure)
    Fetch,
    /// Document is unreadable or produced no usable text
    Content,
    /// Chunking, embedding, indexing or generation failed
    Processing,
    /// Request was rejected before any work was done
    Validation,
    /// Feedback file I/O failed
    Persistence,
    /// An external call exceeded its deadline
    Timeout,
    /// Anything else
    Internal,
}

/// Paper QA errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request failed validation (wrong file type, malformed id, ...)
    #[error("{0}")]
    Validation(String),

    /// Upload exceeded the configured size limit
    #[error("File too large (limit: {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    /// Paper id is unknown to the source
    #[error("Failed to load paper with ID: {0}")]
    PaperNotFound(String),

    /// Fetching a paper failed
    #[error("Failed to fetch paper: {0}")]
    Fetch(String),

    /// Document content is empty or unreadable
    #[error("{0}")]
    Content(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// External call exceeded its deadline
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Feedback persistence error
    #[error("Feedback storage error: {0}")]
    Persistence(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a content error
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a fetch error
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Map a failed outbound request; client-side timeouts become `Timeout`
    pub fn from_request<F>(err: reqwest::Error, operation: &str, timeout_secs: u64, wrap: F) -> Self
    where
        F: FnOnce(String) -> Self,
    {
        if err.is_timeout() {
            Self::timeout(operation, timeout_secs)
        } else {
            wrap(format!("{} failed: {}", operation, err))
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::PayloadTooLarge { .. } => ErrorKind::Validation,
            Error::PaperNotFound(_) | Error::Content(_) => ErrorKind::Content,
            Error::Fetch(_) | Error::Http(_) => ErrorKind::Fetch,
            Error::Embedding(_) | Error::Index(_) | Error::Llm(_) => ErrorKind::Processing,
            Error::Persistence(_) | Error::Io(_) => ErrorKind::Persistence,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Config(_) | Error::Json(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::Fetch)
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Validation(_) | Error::PaperNotFound(_) | Error::Content(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Fetch(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
                "retryable": self.is_retryable(),
            }
        }));

        (status, body).into_response()
    }
}
