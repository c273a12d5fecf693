//! `iterate emit` command implementation
//!
//! Copies every record body to stdout, optionally framed as a JSON array or
//! a GeoJSON FeatureCollection.

use crate::error::Result;
use crate::output::{OutputFormat, RecordWriter};
use iterate_engine::{ConcurrentIterator, Registry};
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Options for `iterate emit`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    pub format: OutputFormat,
    /// Write to a sink instead of stdout
    pub null: bool,
}

impl EmitOptions {
    pub fn new(json: bool, geojson: bool, null: bool) -> Self {
        let format = if geojson {
            OutputFormat::GeoJson
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Raw
        };
        Self { format, null }
    }
}

/// Emit the records yielded by `uris`
pub async fn run(
    iterator_uri: &str,
    uris: &[String],
    options: EmitOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let iterator = Registry::with_defaults().new_iterator(iterator_uri)?;
    let started = Instant::now();

    let (records, bytes) = if options.null {
        emit_records(&iterator, uris, options.format, io::sink(), cancel).await?
    } else {
        let stdout = BufWriter::new(io::stdout());
        emit_records(&iterator, uris, options.format, stdout, cancel).await?
    };

    info!(
        records,
        bytes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Wrote {} bytes",
        bytes
    );

    Ok(())
}

/// Copy every record body to `out`, returning records and bytes written
pub async fn emit_records<W: Write>(
    iterator: &ConcurrentIterator,
    uris: &[String],
    format: OutputFormat,
    out: W,
    cancel: &CancellationToken,
) -> Result<(u64, u64)> {
    let mut writer = RecordWriter::new(out, format)?;
    let mut iteration = iterator.iterate(cancel, uris.iter().cloned());

    while let Some(record) = iteration.next().await {
        let record = record?;
        debug!(path = record.path(), "Emitting record");
        writer.write_record(record)?;
    }
    iteration.shutdown().await;

    let records = writer.records();
    let bytes = writer.finish()?;
    Ok((records, bytes))
}
