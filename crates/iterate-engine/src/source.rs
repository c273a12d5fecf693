//! The source abstraction
//!
//! A [`Source`] turns one URI into a lazy stream of [`Record`]s. The
//! dispatcher owns the concurrency; a source only has to produce records in
//! order and stop early once its cancellation token fires.

use crate::record::Record;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use iterate_common::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Records yielded by one walk of one URI
///
/// An `Err` item ends the walk; the dispatcher decides whether to retry it.
pub type RecordStream = BoxStream<'static, Result<Record>>;

/// Something that knows how to walk a URI
pub trait Source: Send + Sync {
    /// Walk `uri`, yielding every record it contains
    ///
    /// Implementations stop producing records once `cancel` fires or the
    /// returned stream is dropped.
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream;
}

/// Handle a blocking walker uses to hand records to the async side
pub(crate) struct Emitter {
    tx: mpsc::Sender<Result<Record>>,
    cancel: CancellationToken,
}

impl Emitter {
    /// Whether the consumer has gone away or asked us to stop
    pub(crate) fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Send one record, returning false when the walker should stop
    pub(crate) fn emit(&self, record: Record) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.tx.blocking_send(Ok(record)).is_ok()
    }
}

/// Run a blocking walker on the blocking pool and expose its output as a stream
///
/// The walker's own error, if any, becomes the final item of the stream.
/// Must be called from within a Tokio runtime.
pub(crate) fn blocking_stream<F>(uri: &str, cancel: CancellationToken, walker: F) -> RecordStream
where
    F: FnOnce(&Emitter) -> Result<()> + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel(1);
    let uri = uri.to_string();

    tokio::task::spawn_blocking(move || {
        let emitter = Emitter { tx, cancel };

        match walker(&emitter) {
            Ok(()) => trace!(uri = %uri, "Walker finished"),
            Err(err) if emitter.is_stopped() => {
                trace!(uri = %uri, error = %err, "Walker failed after consumer stopped")
            }
            Err(err) => {
                // The receiver may already be gone, nothing left to tell
                let _ = emitter.tx.blocking_send(Err(err));
            }
        }
    });

    stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed()
}
