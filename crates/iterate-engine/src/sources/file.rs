use super::{admit, filters_from_uri, open_record, SharedFilters};
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Yields the single file named by the URI
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    filters: SharedFilters,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for FileSource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let path = PathBuf::from(uri);
        let name = uri.to_string();
        let filters = self.filters.clone();

        blocking_stream(uri, cancel, move |emitter| {
            let mut record = open_record(&path, name)?;
            if admit(&filters, &mut record)? {
                emitter.emit(record);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_yields_one_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("101736545.geojson");
        std::fs::write(&path, r#"{"id":101736545}"#).unwrap();
        let uri = path.to_str().unwrap();

        let mut stream = FileSource::new().walk(uri, CancellationToken::new());
        let mut record = stream.next().await.unwrap().unwrap();

        assert_eq!(record.path(), uri);
        assert_eq!(record.read_all().unwrap(), br#"{"id":101736545}"#);
        assert!(stream.next().await.is_none());
    }
}
