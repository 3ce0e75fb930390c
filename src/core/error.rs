//! Error types and handling for the Canvas gateway
//!
//! This module defines all error types used throughout the service,
//! split between gateway-local failures and upstream Canvas failures.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Canvas gateway
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream Canvas API errors
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while talking to a Canvas instance.
///
/// The `Display` string of each variant is what clients see in the
/// `error` field of the response envelope, so the messages are written
/// for an API consumer rather than an operator.
#[derive(Error, Debug)]
pub enum CanvasError {
    /// The institute URL could not be parsed into a request URL
    #[error("Invalid Canvas base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Connection to the Canvas host failed
    #[error("Cannot connect to Canvas: {0}")]
    Connect(String),

    /// The upstream request timed out
    #[error("Canvas request timed out")]
    Timeout,

    /// Canvas answered with a non-success HTTP status
    #[error("Canvas returned HTTP {status}: {detail}")]
    Status {
        /// HTTP status code from Canvas
        status: u16,
        /// Truncated response body for diagnostics
        detail: String,
    },

    /// The Canvas response body was not valid JSON
    #[error("Failed to decode Canvas response: {0}")]
    Decode(String),

    /// The retry budget was exhausted without a usable response
    #[error("Canvas request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error from the final attempt
        last: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl CanvasError {
    /// Whether another attempt against Canvas could reasonably succeed.
    ///
    /// Rate limiting (429) and server-side failures are transient;
    /// other 4xx statuses indicate a request Canvas will keep rejecting.
    pub fn is_retryable(&self) -> bool {
        match self {
            CanvasError::Connect(_) | CanvasError::Timeout => true,
            CanvasError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure was caused by the request itself (4xx other than 429)
    pub fn is_client_error(&self) -> bool {
        match self {
            CanvasError::InvalidBaseUrl(_) => true,
            CanvasError::Status { status, .. } => (400..500).contains(status) && *status != 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CanvasError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CanvasError::Timeout
        } else if err.is_connect() {
            CanvasError::Connect(err.to_string())
        } else if err.is_decode() {
            CanvasError::Decode(err.to_string())
        } else {
            CanvasError::Connect(err.to_string())
        }
    }
}
