//! `iterate count` command implementation
//!
//! Walks every URI and prints how many records were delivered.

use crate::error::Result;
use iterate_common::IterateError;
use iterate_engine::{ConcurrentIterator, Registry};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Count records yielded by `uris`
pub async fn run(iterator_uri: &str, uris: &[String], cancel: &CancellationToken) -> Result<()> {
    let iterator = Registry::with_defaults().new_iterator(iterator_uri)?;

    let started = Instant::now();
    let count = count_records(&iterator, uris, cancel).await?;

    info!(
        count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Counted {} records",
        count
    );
    println!("{}", count);

    Ok(())
}

/// Drain an iteration over `uris`, returning the number of records delivered
pub async fn count_records(
    iterator: &ConcurrentIterator,
    uris: &[String],
    cancel: &CancellationToken,
) -> std::result::Result<u64, IterateError> {
    let mut iteration = iterator.iterate(cancel, uris.iter().cloned());

    let mut count = 0;
    while let Some(record) = iteration.next().await {
        record?;
        count += 1;
    }
    iteration.shutdown().await;

    Ok(count)
}
