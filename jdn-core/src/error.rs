//! Error types for garden data ingestion, export and configuration.
use thiserror::Error;

/// Main error type for dashboard operations.
///
/// Payloads are plain strings so that a single failed load can be handed
/// to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GardenError {
    /// No data exists for the requested garden or dataset
    #[error("No data available for {0}")]
    NotFound(String),

    /// The source file is malformed beyond row-level tolerance
    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    /// Writing an export failed
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    /// Fetching over the network failed; the caller may try again
    #[error("Network failure while fetching {origin}: {message}")]
    TransientNetwork { origin: String, message: String },

    /// Local filesystem failure other than a missing file
    #[error("I/O failure on {origin}: {message}")]
    Io { origin: String, message: String },

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GardenError {
    pub fn parse(origin: impl Into<String>, message: impl ToString) -> Self {
        GardenError::Parse {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    pub fn write(path: impl Into<String>, message: impl ToString) -> Self {
        GardenError::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether re-issuing the same request can succeed.
    ///
    /// Missing data and malformed files stay that way until the files
    /// change, so they are reported as a "no data" state instead.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GardenError::Write { .. } | GardenError::TransientNetwork { .. } | GardenError::Io { .. }
        )
    }
}

/// Type alias for Results using GardenError
pub type Result<T> = std::result::Result<T, GardenError>;
