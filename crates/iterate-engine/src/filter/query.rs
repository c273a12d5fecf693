//! Content queries evaluated against JSON record bodies
//!
//! Queries come from the source URI as repeated `include=` and `exclude=`
//! parameters, each of the form `dotted.path=regex`:
//!
//! ```text
//! directory://?include=properties.wof:placetype=region&exclude=properties.edtf:deprecated=.+
//! ```

use crate::record::Record;
use crate::uri::query_pairs;
use iterate_common::{IterateError, Result};
use regex::Regex;
use serde_json::Value;
use std::str::FromStr;

pub const PARAM_INCLUDE: &str = "include";
pub const PARAM_EXCLUDE: &str = "exclude";
pub const PARAM_INCLUDE_MODE: &str = "include_mode";
pub const PARAM_EXCLUDE_MODE: &str = "exclude_mode";

/// How a group of queries combines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Every query must match
    #[default]
    All,
    /// At least one query must match
    Any,
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(QueryMode::All),
            "ANY" => Ok(QueryMode::Any),
            _ => Err("expected ALL or ANY".to_string()),
        }
    }
}

/// One `dotted.path=regex` query
#[derive(Debug, Clone)]
pub struct Query {
    path: Vec<String>,
    pattern: Regex,
}

impl Query {
    pub fn parse(option: &str, raw: &str) -> Result<Self> {
        let (path, pattern) = raw
            .split_once('=')
            .filter(|(path, _)| !path.is_empty())
            .ok_or_else(|| IterateError::invalid_option(option, raw, "expected path=pattern"))?;

        Ok(Self {
            path: path.split('.').map(str::to_string).collect(),
            pattern: Regex::new(pattern).map_err(|e| IterateError::invalid_pattern(option, e))?,
        })
    }

    /// Whether the value at this query's path matches its pattern
    ///
    /// A missing path never matches. Arrays match when any element matches.
    pub fn matches(&self, doc: &Value) -> bool {
        let mut value = doc;
        for key in &self.path {
            value = match value {
                Value::Object(map) => match map.get(key) {
                    Some(v) => v,
                    None => return false,
                },
                Value::Array(items) => match key.parse::<usize>().ok().and_then(|i| items.get(i)) {
                    Some(v) => v,
                    None => return false,
                },
                _ => return false,
            };
        }
        value_matches(&self.pattern, value)
    }
}

fn value_matches(pattern: &Regex, value: &Value) -> bool {
    match value {
        Value::String(s) => pattern.is_match(s),
        Value::Number(n) => pattern.is_match(&n.to_string()),
        Value::Bool(b) => pattern.is_match(if *b { "true" } else { "false" }),
        Value::Array(items) => items.iter().any(|item| value_matches(pattern, item)),
        Value::Null | Value::Object(_) => false,
    }
}

/// Include and exclude query groups applied by sources
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    includes: Vec<Query>,
    excludes: Vec<Query>,
    include_mode: QueryMode,
    exclude_mode: QueryMode,
}

impl QueryFilters {
    /// Read query filters from `uri`, or `None` when it carries no queries
    pub fn from_uri(uri: &str) -> Result<Option<Self>> {
        let mut filters = Self::default();

        for (key, value) in query_pairs(uri)? {
            match key.as_str() {
                PARAM_INCLUDE => filters.includes.push(Query::parse(PARAM_INCLUDE, &value)?),
                PARAM_EXCLUDE => filters.excludes.push(Query::parse(PARAM_EXCLUDE, &value)?),
                PARAM_INCLUDE_MODE => {
                    filters.include_mode = value
                        .parse()
                        .map_err(|e| IterateError::invalid_option(PARAM_INCLUDE_MODE, &value, e))?
                }
                PARAM_EXCLUDE_MODE => {
                    filters.exclude_mode = value
                        .parse()
                        .map_err(|e| IterateError::invalid_option(PARAM_EXCLUDE_MODE, &value, e))?
                }
                _ => {}
            }
        }

        Ok((!filters.is_empty()).then_some(filters))
    }

    pub fn with_include(mut self, query: Query) -> Self {
        self.includes.push(query);
        self
    }

    pub fn with_exclude(mut self, query: Query) -> Self {
        self.excludes.push(query);
        self
    }

    pub fn with_include_mode(mut self, mode: QueryMode) -> Self {
        self.include_mode = mode;
        self
    }

    pub fn with_exclude_mode(mut self, mode: QueryMode) -> Self {
        self.exclude_mode = mode;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn matches_document(&self, doc: &Value) -> bool {
        if !self.includes.is_empty() && !evaluate(&self.includes, self.include_mode, doc) {
            return false;
        }

        if !self.excludes.is_empty() && evaluate(&self.excludes, self.exclude_mode, doc) {
            return false;
        }

        true
    }

    /// Decide whether `record` passes, leaving its body rewound
    pub fn apply(&self, record: &mut Record) -> Result<bool> {
        let body = record
            .read_all()
            .map_err(|e| IterateError::read(record.path(), e))?;
        record
            .rewind()
            .map_err(|e| IterateError::read(record.path(), e))?;

        let doc: Value = serde_json::from_slice(&body).map_err(|e| {
            IterateError::parse(format!("Failed to decode '{}' as JSON: {e}", record.path()))
        })?;

        Ok(self.matches_document(&doc))
    }
}

fn evaluate(queries: &[Query], mode: QueryMode, doc: &Value) -> bool {
    match mode {
        QueryMode::All => queries.iter().all(|q| q.matches(doc)),
        QueryMode::Any => queries.iter().any(|q| q.matches(doc)),
    }
}
