//! Scheme registry
//!
//! Maps URI schemes to source constructors. A registry is an ordinary value:
//! build one with [`Registry::with_defaults`], register extra schemes on it
//! and pass it where it is needed.

use crate::dispatcher::ConcurrentIterator;
use crate::options::IteratorOptions;
use crate::source::Source;
use crate::sources::{
    CwdSource, DirectorySource, FeatureCollectionSource, FileListSource, FileSource,
    GeoJsonLSource, NullSource, RepoSource,
};
use crate::uri::{scheme, scrub_uri};
use iterate_common::{IterateError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Builds a source from the full iterator URI
pub type SourceInitFn = fn(&str) -> Result<Arc<dyn Source>>;

const DEFAULT_SCHEMES: &[(&str, SourceInitFn)] = &[
    ("cwd", init_cwd),
    ("directory", init_directory),
    ("featurecollection", init_featurecollection),
    ("file", init_file),
    ("filelist", init_filelist),
    ("geojsonl", init_geojsonl),
    ("null", init_null),
    ("repo", init_repo),
];

/// Scheme to source constructor table
#[derive(Clone, Default)]
pub struct Registry {
    schemes: BTreeMap<String, SourceInitFn>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in scheme
    pub fn with_defaults() -> Self {
        let schemes = DEFAULT_SCHEMES
            .iter()
            .map(|(scheme, init)| (scheme.to_string(), *init))
            .collect();
        Self { schemes }
    }

    /// Register `init` for `scheme`, failing if the scheme is taken
    pub fn register(&mut self, scheme: &str, init: SourceInitFn) -> Result<()> {
        let scheme = scheme.trim_end_matches("://").to_lowercase();
        if self.schemes.contains_key(&scheme) {
            return Err(IterateError::DuplicateScheme(scheme));
        }
        self.schemes.insert(scheme, init);
        Ok(())
    }

    pub fn resolve(&self, scheme: &str) -> Result<SourceInitFn> {
        let scheme = scheme.trim_end_matches("://").to_lowercase();
        self.schemes
            .get(&scheme)
            .copied()
            .ok_or_else(|| IterateError::UnknownScheme {
                registered: self.schemes().join(", "),
                scheme,
            })
    }

    /// Registered schemes as `scheme://`, sorted
    pub fn schemes(&self) -> Vec<String> {
        self.schemes.keys().map(|s| format!("{s}://")).collect()
    }

    /// Build the source for `uri`
    pub fn new_source(&self, uri: &str) -> Result<Arc<dyn Source>> {
        let init = self.resolve(&scheme(uri)?)?;
        init(uri)
    }

    /// Build a concurrent iterator for `uri`: its source plus the `_` options
    pub fn new_iterator(&self, uri: &str) -> Result<ConcurrentIterator> {
        let source = self.new_source(uri)?;
        let options = IteratorOptions::from_uri(uri)?;

        debug!(
            uri = %scrub_uri(uri)?,
            max_procs = options.max_procs,
            "Created iterator"
        );

        Ok(ConcurrentIterator::new(source, options))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

fn init_cwd(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(CwdSource::from_uri(uri)?))
}

fn init_directory(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(DirectorySource::from_uri(uri)?))
}

fn init_featurecollection(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(FeatureCollectionSource::from_uri(uri)?))
}

fn init_file(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(FileSource::from_uri(uri)?))
}

fn init_filelist(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(FileListSource::from_uri(uri)?))
}

fn init_geojsonl(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(GeoJsonLSource::from_uri(uri)?))
}

fn init_null(_uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(NullSource))
}

fn init_repo(uri: &str) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(RepoSource::from_uri(uri)?))
}
