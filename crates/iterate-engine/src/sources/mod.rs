//! Built-in sources
//!
//! | Scheme              | URI passed to `walk`           | Record path          |
//! |---------------------|--------------------------------|----------------------|
//! | `directory://`      | a directory                    | absolute file path   |
//! | `repo://`           | a repository root (`/data`)    | absolute file path   |
//! | `cwd://`            | ignored                        | absolute file path   |
//! | `file://`           | a single file                  | the URI              |
//! | `filelist://`       | a file listing one path a line | each listed path     |
//! | `featurecollection://` | a GeoJSON FeatureCollection | `{uri}#{index}`      |
//! | `geojsonl://`       | line-delimited GeoJSON         | `{uri}#{index}`      |
//! | `null://`           | ignored                        | nothing is yielded   |
//!
//! [`MemorySource`] has no scheme; it is handed to
//! [`crate::ConcurrentIterator::new`] directly.

mod cwd;
mod directory;
mod featurecollection;
mod file;
mod filelist;
mod geojsonl;
mod memory;
mod null;
mod repo;

pub use cwd::CwdSource;
pub use directory::DirectorySource;
pub use featurecollection::FeatureCollectionSource;
pub use file::FileSource;
pub use filelist::FileListSource;
pub use geojsonl::GeoJsonLSource;
pub use memory::MemorySource;
pub use null::NullSource;
pub use repo::RepoSource;

use crate::filter::QueryFilters;
use crate::record::Record;
use crate::source::Emitter;
use iterate_common::{IterateError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Query filters shared between a source and its walkers
pub(crate) type SharedFilters = Option<Arc<QueryFilters>>;

pub(crate) fn filters_from_uri(uri: &str) -> Result<SharedFilters> {
    Ok(QueryFilters::from_uri(uri)?.map(Arc::new))
}

/// Apply content filters, if any, leaving the body rewound
pub(crate) fn admit(filters: &SharedFilters, record: &mut Record) -> Result<bool> {
    match filters {
        Some(filters) => filters.apply(record),
        None => Ok(true),
    }
}

/// Open `path` as a record named `name`
pub(crate) fn open_record(path: &Path, name: impl Into<String>) -> Result<Record> {
    let file = File::open(path).map_err(|e| IterateError::read(path.display().to_string(), e))?;
    Ok(Record::new(name, file))
}

/// Walk every file below `root` in file name order
pub(crate) fn walk_tree(root: &Path, filters: &SharedFilters, emitter: &Emitter) -> Result<()> {
    let root =
        std::path::absolute(root).map_err(|e| IterateError::read(root.display().to_string(), e))?;

    for entry in WalkDir::new(&root).sort_by_file_name() {
        if emitter.is_stopped() {
            return Ok(());
        }

        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .unwrap_or(&root)
                .display()
                .to_string();
            IterateError::walk(root.display().to_string(), IterateError::read(path, e.into()))
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let mut record = open_record(path, path.to_string_lossy())?;

        if !admit(filters, &mut record)? {
            continue;
        }

        if !emitter.emit(record) {
            return Ok(());
        }
    }

    Ok(())
}
