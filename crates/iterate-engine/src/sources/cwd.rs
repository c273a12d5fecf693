use super::{filters_from_uri, walk_tree, SharedFilters};
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::{IterateError, Result};
use tokio_util::sync::CancellationToken;

/// Walks the current working directory, whatever URI it is given
#[derive(Debug, Clone, Default)]
pub struct CwdSource {
    filters: SharedFilters,
}

impl CwdSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for CwdSource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let filters = self.filters.clone();
        blocking_stream(uri, cancel, move |emitter| {
            let root = std::env::current_dir().map_err(|e| IterateError::read(".", e))?;
            walk_tree(&root, &filters, emitter)
        })
    }
}
