//! Error types for Prospector.
//!
//! Library crates use [`ProspectorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Prospector operations.
#[derive(Debug, thiserror::Error)]
pub enum ProspectorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a source or the oracle.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Persistence failure. Never swallowed by the pipeline.
    #[error("storage error: {0}")]
    Storage(String),

    /// Judgment oracle transport or protocol error.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// A source failed to yield candidates for a search term.
    #[error("acquisition error: {0}")]
    Acquisition(String),

    /// A structured payload did not match its schema.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Malformed caller input, rejected before any external call.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Domain validation error (unknown status, missing score, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProspectorError>;

impl ProspectorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a schema error from any displayable message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema {
            message: msg.into(),
        }
    }

    /// Create an invalid-argument error from any displayable message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the persistence layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ProspectorError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = ProspectorError::schema("urgency out of range: 150");
        assert!(err.to_string().contains("urgency out of range"));

        let err = ProspectorError::invalid_argument("searchTerms must not be empty");
        assert!(err.to_string().starts_with("invalid argument"));
    }

    #[test]
    fn storage_errors_are_identified() {
        assert!(ProspectorError::Storage("disk full".into()).is_storage());
        assert!(!ProspectorError::Oracle("timeout".into()).is_storage());
    }
}
