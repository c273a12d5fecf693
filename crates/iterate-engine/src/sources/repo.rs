use super::{filters_from_uri, walk_tree, SharedFilters};
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Name of the records directory inside a repository
pub const DATA_DIR: &str = "data";

/// Walks the `data` directory of a repository checkout
#[derive(Debug, Clone, Default)]
pub struct RepoSource {
    filters: SharedFilters,
}

impl RepoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for RepoSource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let root = Path::new(uri).join(DATA_DIR);
        let filters = self.filters.clone();
        blocking_stream(uri, cancel, move |emitter| walk_tree(&root, &filters, emitter))
    }
}
