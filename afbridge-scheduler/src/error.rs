//! Error types for the scheduler adapter

use std::path::PathBuf;

use afbridge_client::ClientError;
use afbridge_report::ReportError;
use thiserror::Error;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors raised by the scheduler adapter
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration is missing or inconsistent; never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The farm rejected or never received a submission
    #[error("Job submission failed: {0}")]
    Submission(#[source] ClientError),

    /// Querying the farm for job progress failed
    #[error("Progress poll failed: {0}")]
    Poll(#[source] ClientError),

    /// Filesystem operation on the shared root failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report channel could not be started
    #[error("Report server error: {0}")]
    ReportServer(#[from] ReportError),
}

impl SchedulerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the farm could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Submission(e) | Self::Poll(e) => e.is_unreachable(),
            _ => false,
        }
    }
}
