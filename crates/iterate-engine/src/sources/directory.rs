use super::{filters_from_uri, walk_tree, SharedFilters};
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Walks every file below a directory
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    filters: SharedFilters,
}

impl DirectorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a `directory://` URI, reading any content filters it carries
    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for DirectorySource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let root = PathBuf::from(uri);
        let filters = self.filters.clone();
        blocking_stream(uri, cancel, move |emitter| walk_tree(&root, &filters, emitter))
    }
}
