//! Unified error hierarchy for runsplits
//!
//! Provides structured error information for activity import, split
//! aggregation and report export, with severity mapping onto tracing levels.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportError;

/// Top-level error type for all runsplits operations
#[derive(Debug, Error)]
pub enum RunSplitsError {
    /// Empty sample sequence or samples missing required fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Activity file import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Credential store errors
    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Activity file import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required data
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// Invalid data structure
    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    /// File name does not follow the `<timestamp>_<id>_<kind>.json` layout
    #[error("Unrecognized activity file name: {name}")]
    BadFileName { name: String },

    /// Directory holds no files of the requested kind
    #[error("No {kind} files found in {path}")]
    EmptyDirectory { path: PathBuf, kind: String },
}

/// Result type alias for runsplits operations
pub type Result<T> = std::result::Result<T, RunSplitsError>;

impl RunSplitsError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunSplitsError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RunSplitsError::InvalidInput(_) => ErrorSeverity::Warning,
            RunSplitsError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            RunSplitsError::Import(ImportError::BadFileName { .. }) => ErrorSeverity::Warning,
            RunSplitsError::Import(_) => ErrorSeverity::Error,
            RunSplitsError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RunSplitsError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find activity file: {}", path.display())
            }
            RunSplitsError::Import(ImportError::EmptyDirectory { path, kind }) => {
                format!(
                    "No {} files in \"{}\". Download activities first or pass --dir.",
                    kind,
                    path.display()
                )
            }
            RunSplitsError::InvalidInput(reason) => {
                format!("Activity has no usable telemetry: {}", reason)
            }
            RunSplitsError::Auth(reason) => {
                format!("Cached login tokens are unusable: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical error, the command cannot run at all
    Critical,
    /// Error that prevents an operation but the batch can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = RunSplitsError::Import(ImportError::FileNotFound {
            path: PathBuf::from("/activities/missing_details.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = RunSplitsError::Configuration("bad toml".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_invalid_input_not_retryable() {
        let err = RunSplitsError::InvalidInput("empty".to_string());
        assert!(!err.is_retryable());

        let err = RunSplitsError::Io(std::io::Error::new(std::io::ErrorKind::Interrupted, "x"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = RunSplitsError::Import(ImportError::EmptyDirectory {
            path: PathBuf::from("activities"),
            kind: "details".to_string(),
        });
        assert!(err.user_message().contains("No details files"));

        let err: RunSplitsError = ExportError::UnsupportedFormat("pdf".to_string()).into();
        assert_eq!(err.user_message(), "Export error: Unsupported format: pdf");
    }
}
