//! Iterate Engine
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Walks collections of documents (directories, repositories, file lists,
//! feature collections) through a pluggable [`Source`] and yields them
//! concurrently as [`Record`]s.
//!
//! # Overview
//!
//! - **Sources**: [`Source`] implementations in [`sources`], looked up by URI
//!   scheme through a [`Registry`]
//! - **Dispatcher**: [`ConcurrentIterator`] walks many URIs with bounded
//!   concurrency, optional retries and path filtering
//! - **Filters**: [`filter::PathFilter`] on record paths and
//!   [`filter::QueryFilters`] on record contents
//!
//! # Example
//!
//! ```no_run
//! use iterate_engine::Registry;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> iterate_common::Result<()> {
//! let iterator = Registry::with_defaults().new_iterator("repo://?_exclude_alt=true")?;
//! let cancel = CancellationToken::new();
//!
//! let mut iteration = iterator.iterate(&cancel, ["/usr/local/data/whosonfirst-data-admin-us"]);
//! while let Some(record) = iteration.next().await {
//!     let record = record?;
//!     println!("{}", record.path());
//! }
//!
//! println!("{} records", iterator.seen());
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod filter;
pub mod options;
pub mod record;
pub mod registry;
pub mod source;
pub mod sources;
pub mod uri;
pub mod wof;

pub use dispatcher::{ConcurrentIterator, Iteration};
pub use options::{IteratorOptions, RetryPolicy};
pub use record::{Record, RecordBody};
pub use registry::{Registry, SourceInitFn};
pub use source::{RecordStream, Source};
