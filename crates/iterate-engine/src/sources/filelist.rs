use super::{admit, filters_from_uri, open_record, SharedFilters};
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::{IterateError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Yields every file listed, one path per line, in the file named by the URI
///
/// Blank lines are skipped.
#[derive(Debug, Clone, Default)]
pub struct FileListSource {
    filters: SharedFilters,
}

impl FileListSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for FileListSource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let list = uri.to_string();
        let filters = self.filters.clone();

        blocking_stream(uri, cancel, move |emitter| {
            let file = File::open(&list).map_err(|e| IterateError::read(&list, e))?;

            for line in BufReader::new(file).lines() {
                if emitter.is_stopped() {
                    break;
                }

                let line = line.map_err(|e| IterateError::read(&list, e))?;
                let path = line.trim();
                if path.is_empty() {
                    continue;
                }

                let mut record = open_record(Path::new(path), path)?;
                if admit(&filters, &mut record)? && !emitter.emit(record) {
                    break;
                }
            }

            Ok(())
        })
    }
}
