//! Record filtering
//!
//! Two layers decide whether a record is yielded:
//!
//! - [`PathFilter`] runs in the dispatcher on every path: include pattern,
//!   exclude pattern, alternate geometry check, then dedupe, in that order.
//! - [`QueryFilters`] run inside sources on the parsed document body.

pub mod query;

pub use query::{Query, QueryFilters, QueryMode};

use crate::wof;
use iterate_common::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Identities already yielded during one iteration
#[derive(Debug, Default)]
pub struct DedupeSet {
    seen: Mutex<HashSet<String>>,
}

impl DedupeSet {
    /// Record `identity`, returning true when it had not been seen before
    pub fn insert(&self, identity: String) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Path based gate applied to every record before it is yielded
///
/// Built per iteration by [`crate::IteratorOptions::path_filter`]; clones
/// share the same dedupe set.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
    pub exclude_alt_files: bool,
    pub dedupe: Option<Arc<DedupeSet>>,
}

impl PathFilter {
    /// Decide whether the record at `path` is yielded
    ///
    /// Errors when the alternate geometry check or dedupe needs to parse a
    /// path that is not a record filename.
    pub fn should_yield(&self, path: &str) -> Result<bool> {
        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return Ok(false);
            }
        }

        if let Some(exclude) = &self.exclude {
            if exclude.is_match(path) {
                return Ok(false);
            }
        }

        if self.exclude_alt_files && wof::is_alt_file(path)? {
            return Ok(false);
        }

        if let Some(dedupe) = &self.dedupe {
            let identity = wof::parse_uri(path)?.identity();
            if !dedupe.insert(identity) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
