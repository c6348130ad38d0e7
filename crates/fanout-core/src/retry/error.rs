//! Normalized failure type shared by the retry loop, executor, and client.

use std::collections::BTreeMap;
use std::fmt;

/// Fixed message used when a request was dispatched but nothing came back.
pub const NO_RESPONSE_MESSAGE: &str = "no response received, check connectivity";

const UNKNOWN_MESSAGE: &str = "Unknown error";

/// High-level classification of a failed remote call for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server asked us to slow down (HTTP 429, carries a wait hint).
    RateLimited,
    /// Request rejected by the server (4xx). Retrying won't help.
    Client,
    /// Server-side failure (5xx).
    Server,
    /// Request was dispatched but no response came back (connect, timeout).
    NoResponse,
    /// Request could not even be built; nothing was sent.
    RequestConstruction,
}

/// Failure of one remote operation, normalized so callers never branch on
/// transport internals.
///
/// `status` is 0 when no response was obtained, which is distinct from every
/// real HTTP status. `retry_after_secs` is populated only on `RateLimited`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
    /// Per-field validation messages from a structured error body, if any.
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
    /// Server-provided wait hint in seconds.
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    /// HTTP 429 with a resolved wait hint.
    pub fn rate_limited(message: String, retry_after_secs: u64) -> Self {
        Self {
            kind: ErrorKind::RateLimited,
            status: 429,
            message,
            field_errors: None,
            retry_after_secs: Some(retry_after_secs),
        }
    }

    /// Any non-429 response status; 5xx maps to `Server`, the rest to `Client`.
    pub fn http(status: u16, message: String, field_errors: Option<BTreeMap<String, Vec<String>>>) -> Self {
        let kind = if status >= 500 { ErrorKind::Server } else { ErrorKind::Client };
        Self {
            kind,
            status,
            message,
            field_errors,
            retry_after_secs: None,
        }
    }

    /// Request went out, nothing came back.
    pub fn no_response() -> Self {
        Self {
            kind: ErrorKind::NoResponse,
            status: 0,
            message: NO_RESPONSE_MESSAGE.to_string(),
            field_errors: None,
            retry_after_secs: None,
        }
    }

    /// Request failed before dispatch (bad URL, unbuildable request).
    pub fn request(message: String) -> Self {
        let message = if message.is_empty() {
            UNKNOWN_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            kind: ErrorKind::RequestConstruction,
            status: 0,
            message,
            field_errors: None,
            retry_after_secs: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::NoResponse | ErrorKind::RequestConstruction => {
                write!(f, "{}", self.message)
            }
            _ => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

impl std::error::Error for ApiError {}
