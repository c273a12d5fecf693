//! Iterate Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the iterate workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`IterateError`] and the [`Result`] alias used by every crate
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`] for `tracing` setup
//!
//! # Example
//!
//! ```no_run
//! use iterate_common::{IterateError, Result};
//!
//! fn max_procs(value: &str) -> Result<usize> {
//!     value
//!         .parse()
//!         .map_err(|e| IterateError::invalid_option("_max_procs", value, e))
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{IterateError, Result};
