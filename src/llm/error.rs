//! Error types for completion service calls.

use std::fmt;

use thiserror::Error;

/// Broad classification of a completion service failure.
///
/// The classification is informational: the call executor retries every kind
/// identically. It exists so logs say what actually went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Could not reach the service at all.
    Connection,
    /// The request was sent but no answer arrived in time.
    Timeout,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// HTTP 400/404/422 and friends.
    InvalidRequest,
    /// HTTP 401/403.
    Authentication,
    /// The body could not be decoded or lacked required fields.
    MalformedResponse,
}

impl LlmErrorKind {
    /// Whether this kind is a connectivity-class failure.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Connection | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::MalformedResponse => "malformed_response",
        };
        write!(f, "{}", s)
    }
}

/// A failed exchange with the completion service.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Connection, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            LlmErrorKind::Timeout
        } else if err.is_decode() {
            LlmErrorKind::MalformedResponse
        } else if let Some(status) = err.status() {
            classify_http_status(status.as_u16())
        } else {
            LlmErrorKind::Connection
        };
        let status = err.status().map(|s| s.as_u16());
        Self {
            kind,
            message: err.to_string(),
            status,
        }
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        401 | 403 => LlmErrorKind::Authentication,
        408 => LlmErrorKind::Timeout,
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::ServerError,
        _ => LlmErrorKind::InvalidRequest,
    }
}
