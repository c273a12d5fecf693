use super::{admit, filters_from_uri, SharedFilters};
use crate::record::Record;
use crate::source::{blocking_stream, RecordStream, Source};
use iterate_common::{IterateError, Result};
use serde_json::Value;
use std::io::Cursor;
use tokio_util::sync::CancellationToken;

/// Yields each feature of a GeoJSON FeatureCollection as `{uri}#{index}`
#[derive(Debug, Clone, Default)]
pub struct FeatureCollectionSource {
    filters: SharedFilters,
}

impl FeatureCollectionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self {
            filters: filters_from_uri(uri)?,
        })
    }
}

impl Source for FeatureCollectionSource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let path = uri.to_string();
        let filters = self.filters.clone();

        blocking_stream(uri, cancel, move |emitter| {
            let body = std::fs::read(&path).map_err(|e| IterateError::read(&path, e))?;
            let mut collection: Value = serde_json::from_slice(&body).map_err(|e| {
                IterateError::parse(format!("Failed to decode '{path}' as a FeatureCollection: {e}"))
            })?;

            let features = match collection.get_mut("features").map(Value::take) {
                Some(Value::Array(features)) => features,
                _ => {
                    return Err(IterateError::parse(format!(
                        "'{path}' has no features array"
                    )))
                }
            };

            for (index, feature) in features.iter().enumerate() {
                if emitter.is_stopped() {
                    break;
                }

                let mut record = Record::new(
                    format!("{path}#{index}"),
                    Cursor::new(serde_json::to_vec(feature)?),
                );

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
    use crate::sources::test_support::collect_paths;
    use futures::StreamExt;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_yields_features_with_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.geojson");
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"wof:placetype": "region"}},
                {"type": "Feature", "properties": {"wof:placetype": "county"}},
                {"type": "Feature", "properties": {"wof:placetype": "region"}}
            ]
        });
        std::fs::write(&path, serde_json::to_vec(&collection).unwrap()).unwrap();
        let uri = path.to_str().unwrap();

        let paths = collect_paths(FeatureCollectionSource::new().walk(uri, CancellationToken::new())).await;
        assert_eq!(paths, vec![format!("{uri}#0"), format!("{uri}#1"), format!("{uri}#2")]);

        let source = FeatureCollectionSource::from_uri(
            "featurecollection://?include=properties.wof:placetype=region",
        )
        .unwrap();
        let paths = collect_paths(source.walk(uri, CancellationToken::new())).await;
        assert_eq!(paths, vec![format!("{uri}#0"), format!("{uri}#2")]);
    }

    #[tokio::test]
    async fn test_rejects_non_collections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feature.geojson");
        std::fs::write(&path, r#"{"type":"Feature"}"#).unwrap();

        let mut stream =
            FeatureCollectionSource::new().walk(path.to_str().unwrap(), CancellationToken::new());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, IterateError::Parse(_)));
    }
}
