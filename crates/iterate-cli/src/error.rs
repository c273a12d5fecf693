//! Error types for the iterate CLI
//!
//! Messages are user-facing and say what to check next.

use iterate_common::IterateError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// The iterator URI or one of its options is invalid
    #[error("Invalid iterator URI: {0}. Run 'iterate schemes' to list the supported schemes.")]
    Configuration(IterateError),

    /// Walking the URIs failed
    #[error("Iteration failed: {0}")]
    Iteration(IterateError),

    /// Writing output failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<IterateError> for CliError {
    fn from(err: IterateError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Iteration(err)
        }
    }
}
