//! Error model used by Arbiter API client operations.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArbiterError>;

/// Represents the error conditions surfaced by Arbiter data-source operations: missing
/// records, rejected input, authentication failures and the transient network/HTTP
/// failures a user may retry.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("http {status}: {message}")]
    Http {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl ArbiterError {
    /// Constructs an HTTP error variant with optional API-specific code.
    pub fn http(status: StatusCode, code: Option<String>, message: impl Into<String>) -> Self {
        ArbiterError::Http {
            status,
            code,
            message: message.into(),
        }
    }

    /// Returns true when the failure is recoverable by a user-initiated retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ArbiterError::Timeout(_) | ArbiterError::Network(_) => true,
            ArbiterError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ArbiterError {
    /// Converts reqwest errors into semantic ArbiterError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ArbiterError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            ArbiterError::Http {
                status,
                code: None,
                message: err.to_string(),
            }
        } else if err.is_connect() {
            ArbiterError::Network(err.to_string())
        } else {
            ArbiterError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ArbiterError {
    /// Converts serde_json decode/encode failures into serialization errors.
    fn from(err: serde_json::Error) -> Self {
        ArbiterError::Serialization(err.to_string())
    }
}
