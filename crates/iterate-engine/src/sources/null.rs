use crate::source::{RecordStream, Source};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

/// Yields nothing for any URI
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl Source for NullSource {
    fn walk(&self, _uri: &str, _cancel: CancellationToken) -> RecordStream {
        stream::empty().boxed()
    }
}
