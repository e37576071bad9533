use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for unatlas operations
#[derive(Error, Diagnostic, Debug)]
pub enum AtlasError {
    #[error("IO error: {0}")]
    #[diagnostic(code(unatlas::io))]
    IoError(#[from] std::io::Error),

    /// A metadata or atlas file is missing or unreadable.
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(unatlas::io))]
    Io { path: PathBuf, message: String },

    /// Metadata is structurally invalid for its dialect.
    #[error("Format error in {path}: {message}")]
    #[diagnostic(code(unatlas::format))]
    Format {
        path: PathBuf,
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Metadata parsed but describes nothing usable.
    #[error("Content error in {path}: {message}")]
    #[diagnostic(code(unatlas::content))]
    Content {
        path: PathBuf,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(unatlas::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Export error: {message}")]
    #[diagnostic(code(unatlas::export))]
    Export {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The operator declined to pick a background colour.
    #[error("Cancelled by user: {path}")]
    #[diagnostic(code(unatlas::cancelled))]
    Cancelled { path: PathBuf },
}

impl AtlasError {
    /// Shorthand for a format error without help text.
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AtlasError::Format {
            path: path.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Shorthand for an empty-sprite-list content error.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        AtlasError::Content {
            path: path.into(),
            message: "no sprites found".to_string(),
            help: Some("Check that the metadata file matches its atlas dialect".to_string()),
        }
    }

    /// Shorthand for an export error without help text.
    pub fn export(message: impl Into<String>) -> Self {
        AtlasError::Export {
            message: message.into(),
            help: None,
        }
    }

    /// Whether this error represents a user-initiated skip rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AtlasError::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
