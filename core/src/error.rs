//! Error types for the productivity API client.
//!
//! # Design
//! Failures fall into two families that callers treat differently:
//! transport errors (no usable response) and application errors (the server
//! answered `{"success": false, "error": ...}`). Locally rejected input is a
//! third, request-less family. [`ApiError::kind`] exposes the family so the
//! sync layer can decide what is user-facing.

use thiserror::Error;

/// Errors produced while building requests or parsing responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was obtained: connection refused, DNS, timeout, I/O.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned a non-2xx status without a readable envelope.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The body was not JSON or did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The server answered with `success: false`. Empty when the server gave
    /// no message.
    #[error("{}", application_text(.0))]
    Application(String),

    /// The input was rejected before any request was built.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Application,
    Local,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(_) | ApiError::HttpStatus { .. } | ApiError::Decode(_) => {
                ErrorKind::Transport
            }
            ApiError::Application(_) => ErrorKind::Application,
            ApiError::Validation(_) | ApiError::Serialization(_) => ErrorKind::Local,
        }
    }
}

fn application_text(message: &str) -> &str {
    if message.is_empty() {
        "request rejected by server"
    } else {
        message
    }
}
