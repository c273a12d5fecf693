use super::{admit, filters_from_uri, SharedFilters};
use crate::record::Record;
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::{IterateError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use tokio_util::sync::CancellationToken;

/// Yields each line of a line-delimited GeoJSON file as `{uri}#{index}`
///
/// The index counts non-blank lines from zero.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonLSource {
    filters: SharedFilters,
}

impl GeoJsonLSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for GeoJsonLSource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let path = uri.to_string();
        let filters = self.filters.clone();

        blocking_stream(uri, cancel, move |emitter| {
            let file = File::open(&path).map_err(|e| IterateError::read(&path, e))?;

            let lines = BufReader::new(file)
                .lines()
                .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()));

            for (index, line) in lines.enumerate() {
                if emitter.is_stopped() {
                    break;
                }

                let line = line.map_err(|e| IterateError::read(&path, e))?;
                let mut record = Record::new(format!("{path}#{index}"), Cursor::new(line.into_bytes()));

                if admit(&filters, &mut record)? && !emitter.emit(record) {
                    break;
                }
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
    async fn test_yields_each_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.geojsonl");
        std::fs::write(&path, "{\"id\":1}\n\n{\"id\":2}\n").unwrap();
        let uri = path.to_str().unwrap();

        let mut stream = GeoJsonLSource::new().walk(uri, CancellationToken::new());

        let mut first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.path(), format!("{uri}#0"));
        assert_eq!(first.read_all().unwrap(), br#"{"id":1}"#);

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.path(), format!("{uri}#1"));

        assert!(stream.next().await.is_none());
    }
}
