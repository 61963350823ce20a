//! Shared Error Types
//!
//! This module defines the error types surfaced by the client to the code that
//! drives it (CLI commands, page handlers).
//!
//! # Error Categories
//!
//! - `ClientError` - Everything an API call can fail with
//! - `StorageError` - Persistence failures of the local key-value store
//!
//! Authentication failures are kept apart from ordinary failures so callers can
//! tell "you are logged out" from "the requested operation failed":
//!
//! ```rust
//! use leadhub::shared::error::ClientError;
//!
//! let error = ClientError::SessionExpired { status: 401 };
//! assert!(error.is_auth_error());
//!
//! let error = ClientError::http(500, "Failed to load leads");
//! assert!(!error.is_auth_error());
//! ```
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::config::ConfigError;

/// Errors returned by the client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Login was rejected by the backend
    #[error("Invalid credentials")]
    InvalidCredentials {
        /// HTTP status returned by the login endpoint
        status: u16,
    },

    /// A refresh was needed but no refresh token is stored
    #[error("No refresh token")]
    NoRefreshToken,

    /// The refresh call itself was rejected; the user must log in again
    #[error("Session expired")]
    SessionExpired {
        /// HTTP status returned by the refresh endpoint
        status: u16,
    },

    /// Non-success response from a typed API call
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Backend `detail` or a fixed per-operation message
        message: String,
    },

    /// Transport-level failure (connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success response whose body could not be parsed
    #[error("Failed to parse response: {message}")]
    Decode {
        /// Human-readable error message
        message: String,
    },

    /// A header value that cannot be put on the wire
    #[error("Invalid value for header '{name}'")]
    InvalidHeader {
        /// Header name
        name: String,
    },

    /// URL fragment does not carry an OAuth token handoff
    #[error("URL fragment does not contain an access token")]
    NotAHandoff,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Create a new HTTP error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new invalid header error
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// True when the error means the local session is gone and the user has
    /// to sign in again.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::SessionExpired { .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials { status }
            | Self::SessionExpired { status }
            | Self::Http { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("JSON error: {}", err))
    }
}

/// Local storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
