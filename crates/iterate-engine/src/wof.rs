//! Who's On First filename conventions
//!
//! Records are stored as `{id}.geojson` under a directory tree derived from
//! the id, with alternate geometries next to them as
//! `{id}-alt-{source}[-{function}[-{extra}...]].geojson`.

use iterate_common::{IterateError, Result};

const EXTENSION: &str = ".geojson";
const ALT_SEPARATOR: &str = "-alt-";

/// Alternate geometry qualifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltGeom {
    pub source: String,
    pub function: Option<String>,
    pub extras: Vec<String>,
}

/// A parsed record filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WofUri {
    pub id: i64,
    pub alt: Option<AltGeom>,
}

impl WofUri {
    pub fn is_alternate(&self) -> bool {
        self.alt.is_some()
    }

    /// Filename of this record, e.g. `101736545-alt-quattroshapes.geojson`
    pub fn filename(&self) -> String {
        match &self.alt {
            None => format!("{}.geojson", self.id),
            Some(alt) => {
                let mut parts = vec![alt.source.as_str()];
                if let Some(function) = &alt.function {
                    parts.push(function);
                }
                parts.extend(alt.extras.iter().map(String::as_str));
                format!("{}-alt-{}.geojson", self.id, parts.join("-"))
            }
        }
    }

    /// Path relative to a data directory, e.g. `101/736/545/101736545.geojson`
    pub fn rel_path(&self) -> String {
        format!("{}/{}", id_to_path(self.id), self.filename())
    }

    /// Relative path of the primary record this file belongs to
    ///
    /// Alternate geometries share the identity of their primary record.
    pub fn identity(&self) -> String {
        format!("{}/{}.geojson", id_to_path(self.id), self.id)
    }
}

/// Parse the last segment of `path` as a record filename
pub fn parse_uri(path: &str) -> Result<WofUri> {
    let invalid = || IterateError::parse(format!("Failed to parse '{path}' as a record path"));

    let filename = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = filename.strip_suffix(EXTENSION).ok_or_else(invalid)?;

    let (id, alt) = match stem.split_once(ALT_SEPARATOR) {
        Some((id, alt)) => (id, Some(alt)),
        None => (stem, None),
    };

    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let id = id
        .parse()
        .map_err(|e| IterateError::parse(format!("Invalid id in '{path}': {e}")))?;

    let alt = match alt {
        None => None,
        Some(qualifiers) => {
            let mut parts = qualifiers.split('-').map(str::to_string);
            let source = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
            Some(AltGeom {
                source,
                function: parts.next(),
                extras: parts.collect(),
            })
        }
    };

    Ok(WofUri { id, alt })
}

/// Whether `path` names an alternate geometry file
pub fn is_alt_file(path: &str) -> Result<bool> {
    Ok(parse_uri(path)?.is_alternate())
}

/// Directory for `id`, split into three digit chunks
pub fn id_to_path(id: i64) -> String {
    let digits = id.to_string();
    digits
        .as_bytes()
        .chunks(3)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative path of the primary record for `id`
pub fn id_to_rel_path(id: i64) -> String {
    WofUri { id, alt: None }.rel_path()
}
