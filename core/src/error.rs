//! Error type for the blog API client.
//!
//! # Design
//! Every failure, whatever its origin, is flattened into one `ApiError`
//! shape: a human-readable `message` plus the HTTP `status` when the server
//! answered. Callers render the message and optionally branch on the status;
//! they never need to know whether the socket, the clock or the JSON decoder
//! failed. The origin is still recorded in `ErrorKind` for logs.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of every client and service operation.
pub type ApiResult<T> = Result<T, ApiError>;

/// Where a failure came from. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    Http,
    /// The response body did not match the expected shape.
    Decode,
    #[default]
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Http => "http",
            ErrorKind::Decode => "decode",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed API call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip)]
    kind: ErrorKind,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status: Option<u16>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            status,
            kind,
        }
    }

    pub fn network() -> Self {
        Self::new("Network Error", None, ErrorKind::Network)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            format!("timeout of {}ms exceeded", after.as_millis()),
            None,
            ErrorKind::Timeout,
        )
    }

    /// Build the error for a non-2xx response.
    ///
    /// The message is taken from a `message` string in a JSON body when the
    /// server sent one, otherwise from the status's reason phrase.
    pub fn http(status: u16, body: &str) -> Self {
        let message = message_from_body(body)
            .or_else(|| {
                StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("Request failed with status code {status}"));
        Self::new(message, Some(status), ErrorKind::Http)
    }

    pub fn decode(err: &serde_json::Error) -> Self {
        Self::new(format!("invalid response body: {err}"), None, ErrorKind::Decode)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(message, None, ErrorKind::Unknown)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
