//! Error handling for the modal registry
//!
//! The registry itself never fails: malformed input (unknown ids, missing
//! renderers) degrades to a logged diagnostic so a benign race cannot
//! destabilize the surrounding UI. This module covers the fallible ambient
//! surfaces instead: configuration loading, theme lookup and terminal glue.

use thiserror::Error;

/// Result type alias for fallible modal-registry operations
pub type ModalResult<T> = std::result::Result<T, ModalError>;

/// Errors raised by the crate's ambient surfaces
#[derive(Error, Debug)]
pub enum ModalError {
    /// I/O errors (config files, terminal handles)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Prop bag serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Terminal/host operation errors
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Generic application errors
    #[error("Application error: {message}")]
    Application { message: String },
}

impl ModalError {
    /// Create a new Terminal error
    pub fn terminal<S: Into<String>>(message: S) -> Self {
        Self::Terminal(message.into())
    }

    /// Create a new Application error
    pub fn application<S: Into<String>>(message: S) -> Self {
        Self::Application {
            message: message.into(),
        }
    }

    /// Whether the error leaves the subsystem in a usable state
    ///
    /// Configuration and application errors fall back to defaults; only
    /// I/O failures against a live terminal are treated as unrecoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    /// Error severity for diagnostics and user feedback
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io(_) | Self::Terminal(_) => ErrorSeverity::High,
            Self::Config(_) | Self::Serde(_) => ErrorSeverity::Medium,
            Self::Application { .. } => ErrorSeverity::Medium,
        }
    }
}

/// Severity levels for error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}
