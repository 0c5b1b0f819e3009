//! Error types and result aliases for vsix-fetch operations.
//!
//! Every failure that can end a run is a variant of [`VsixError`]. A rate
//! limit that is still within its retry budget never becomes an error; only
//! its exhaustion does.

use thiserror::Error;

/// Unified error type for all vsix-fetch operations
#[derive(Error, Debug)]
pub enum VsixError {
    // Identifier errors
    #[error("Malformed extension identifier '{token}': {reason}")]
    MalformedIdentifier { token: String, reason: String },

    // Upstream errors
    #[error("Unknown upstream '{name}' (expected one of: local, marketplace, publisher-asset)")]
    UnknownUpstream { name: String },

    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    TomlParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Network errors
    #[error("Rate limited while fetching '{identifier}' after {retries} retry; giving up")]
    RateLimitExhausted { identifier: String, retries: u32 },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Installer errors
    #[error("Installer command '{command}' failed: {message}")]
    Installer {
        command: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for vsix-fetch operations
pub type VsixResult<T> = Result<T, VsixError>;

impl VsixError {
    /// Create a transport error from any error type
    pub fn transport<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message,
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a transport error for an unexpected HTTP status
    pub fn http_status(url: &str, status: u16) -> Self {
        Self::Transport {
            message: format!("GET {} returned HTTP {}", url, status),
            status: Some(status),
            source: None,
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// HTTP status code attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            VsixError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            VsixError::MalformedIdentifier { .. } => {
                Some("Identifiers look like 'publisher.extension@1.2.3'")
            },
            VsixError::UnknownUpstream { .. } => {
                Some("Pass --upstream with one of: local, marketplace, publisher-asset")
            },
            VsixError::RateLimitExhausted { .. } => {
                Some(
                    "Wait for the rate limit window to reset, then rerun with the remaining extensions",
                )
            },
            VsixError::Transport { status: Some(404), .. } => {
                Some("Check that the extension version exists on the selected upstream")
            },
            VsixError::Transport { .. } => Some("Check your internet connection and try again"),
            VsixError::Installer { .. } => {
                Some("Make sure VS Code is installed and its command line launcher is on PATH")
            },
            _ => None,
        }
    }
}
