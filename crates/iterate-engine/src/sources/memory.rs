use super::{admit, SharedFilters};
use crate::filter::QueryFilters;
use crate::record::Record;
use crate::source::{RecordStream, Source};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Walk URI that selects every entry of a [`MemorySource`]
pub const ROOT: &str = ".";

/// An in-memory tree of documents keyed by slash separated path
///
/// Walking a URI yields every entry equal to it or below it, in path order.
/// `.` and the empty string select everything.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Arc<[u8]>>,
    filters: SharedFilters,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(path, body);
        self
    }

    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.filters = Some(Arc::new(filters));
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, body: impl Into<Vec<u8>>) {
        let body: Vec<u8> = body.into();
        self.files.insert(path.into(), Arc::from(body));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn select(&self, uri: &str) -> Vec<(String, Arc<[u8]>)> {
        let prefix = uri.trim_end_matches('/');

        self.files
            .iter()
            .filter(|(path, _)| {
                prefix.is_empty()
                    || prefix == ROOT
                    || path.as_str() == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|(path, body)| (path.clone(), Arc::clone(body)))
            .collect()
    }
}

impl Source for MemorySource {
    fn walk(&self, uri: &str, cancel: CancellationToken) -> RecordStream {
        let filters = self.filters.clone();

        let records = self.select(uri).into_iter().filter_map(move |(path, body)| {
            let mut record = Record::new(path, Cursor::new(body));
            match admit(&filters, &mut record) {
                Ok(true) => Some(Ok(record)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            }
        });

        stream::iter(records)
            .take_until(cancel.cancelled_owned())
            .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::filter::Query;
    use crate::sources::test_support::collect_paths;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_file("data/101/736/545/101736545.geojson", r#"{"properties":{"wof:placetype":"locality"}}"#)
            .with_file("data/85/688/637/85688637.geojson", r#"{"properties":{"wof:placetype":"region"}}"#)
            .with_file("database/1.geojson", "{}")
    }

    #[tokio::test]
    async fn test_prefix_selection() {
        let source = source();

        let all = collect_paths(source.walk(ROOT, CancellationToken::new())).await;
        assert_eq!(all.len(), 3);

        let data = collect_paths(source.walk("data/", CancellationToken::new())).await;
        assert_eq!(
            data,
            vec![
                "data/101/736/545/101736545.geojson".to_string(),
                "data/85/688/637/85688637.geojson".to_string(),
            ]
        );

        let one = collect_paths(source.walk("database/1.geojson", CancellationToken::new())).await;
        assert_eq!(one, vec!["database/1.geojson".to_string()]);

        assert!(collect_paths(source.walk("missing", CancellationToken::new())).await.is_empty());
    }

    #[tokio::test]
    async fn test_content_filters() {
        let filters = QueryFilters::default()
            .with_include(Query::parse("include", "properties.wof:placetype=region").unwrap());
        let source = MemorySource::new()
            .with_file("data/85/688/637/85688637.geojson", r#"{"properties":{"wof:placetype":"region"}}"#)
            .with_file("data/101/736/545/101736545.geojson", r#"{"properties":{"wof:placetype":"locality"}}"#)
            .with_filters(filters);

        let paths = collect_paths(source.walk("data", CancellationToken::new())).await;
        assert_eq!(paths, vec!["data/85/688/637/85688637.geojson".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_walk_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(collect_paths(source().walk(ROOT, cancel)).await.is_empty());
    }
}
