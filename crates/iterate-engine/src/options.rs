//! Iterator options
//!
//! Options are read from the query string of an iterator URI such as
//! `repo://?_max_procs=4&_exclude_alt=true&_dedupe=true`. Unknown parameters
//! are left alone for the source to interpret.

use crate::filter::{DedupeSet, PathFilter};
use crate::uri::{parse_bool, query_pairs};
use iterate_common::{IterateError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const PARAM_MAX_PROCS: &str = "_max_procs";
pub const PARAM_RETRY: &str = "_retry";
pub const PARAM_MAX_RETRIES: &str = "_max_retries";
pub const PARAM_RETRY_AFTER: &str = "_retry_after";
pub const PARAM_INCLUDE: &str = "_include";
pub const PARAM_EXCLUDE: &str = "_exclude";
pub const PARAM_EXCLUDE_ALT: &str = "_exclude_alt";
pub const PARAM_DEDUPE: &str = "_dedupe";

/// Attempts per URI when retries are enabled without `_max_retries`
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Base delay between attempts when retries are enabled without `_retry_after`
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 10;

/// How many times a failing URI is walked and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base delay, multiplied by the attempt number
    pub retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_after: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_after: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_after,
        }
    }

    /// Whether a failed walk is ever attempted again
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Delay before the attempt following `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_after.saturating_mul(attempt)
    }
}

/// Dispatcher and path filter settings
#[derive(Debug, Clone)]
pub struct IteratorOptions {
    /// Maximum number of URIs walked at the same time
    pub max_procs: usize,
    pub retry: RetryPolicy,
    /// Only paths matching this pattern are yielded
    pub include: Option<Regex>,
    /// Paths matching this pattern are skipped
    pub exclude: Option<Regex>,
    /// Skip alternate geometry files
    pub exclude_alt_files: bool,
    /// Yield each record identity at most once per iteration
    pub dedupe: bool,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        Self {
            max_procs: num_cpus::get(),
            retry: RetryPolicy::default(),
            include: None,
            exclude: None,
            exclude_alt_files: false,
            dedupe: false,
        }
    }
}

impl IteratorOptions {
    /// Parse options from the query string of an iterator URI
    pub fn from_uri(uri: &str) -> Result<Self> {
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in query_pairs(uri)? {
            // The first occurrence of a parameter wins
            params.entry(key).or_insert(value);
        }

        let mut options = Self::default();

        if let Some(value) = params.get(PARAM_MAX_PROCS) {
            options.max_procs = parse_positive(PARAM_MAX_PROCS, value)?;
        }

        if let Some(value) = params.get(PARAM_RETRY) {
            if parse_bool(PARAM_RETRY, value)? {
                let mut max_attempts = DEFAULT_MAX_ATTEMPTS;
                let mut retry_after = DEFAULT_RETRY_AFTER_SECS;

                if let Some(value) = params.get(PARAM_MAX_RETRIES) {
                    max_attempts = parse_positive(PARAM_MAX_RETRIES, value)?;
                }

                if let Some(value) = params.get(PARAM_RETRY_AFTER) {
                    retry_after = value
                        .parse()
                        .map_err(|e| IterateError::invalid_option(PARAM_RETRY_AFTER, value, e))?;
                }

                options.retry = RetryPolicy::new(max_attempts, Duration::from_secs(retry_after));
            }
        }

        if let Some(value) = params.get(PARAM_INCLUDE) {
            options.include = Some(compile(PARAM_INCLUDE, value)?);
        }

        if let Some(value) = params.get(PARAM_EXCLUDE) {
            options.exclude = Some(compile(PARAM_EXCLUDE, value)?);
        }

        if let Some(value) = params.get(PARAM_EXCLUDE_ALT) {
            options.exclude_alt_files = parse_bool(PARAM_EXCLUDE_ALT, value)?;
        }

        if let Some(value) = params.get(PARAM_DEDUPE) {
            options.dedupe = parse_bool(PARAM_DEDUPE, value)?;
        }

        Ok(options)
    }

    pub fn with_max_procs(mut self, max_procs: usize) -> Self {
        self.max_procs = max_procs.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_include(mut self, pattern: &str) -> Result<Self> {
        self.include = Some(compile(PARAM_INCLUDE, pattern)?);
        Ok(self)
    }

    pub fn with_exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude = Some(compile(PARAM_EXCLUDE, pattern)?);
        Ok(self)
    }

    pub fn with_exclude_alt_files(mut self, exclude: bool) -> Self {
        self.exclude_alt_files = exclude;
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Build the path filter for one iteration, with a fresh dedupe set
    pub fn path_filter(&self) -> PathFilter {
        PathFilter {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            exclude_alt_files: self.exclude_alt_files,
            dedupe: self.dedupe.then(|| Arc::new(DedupeSet::default())),
        }
    }
}

fn parse_positive<T>(option: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + Default + PartialOrd,
    T::Err: std::fmt::Display,
{
    let parsed: T = value
        .parse()
        .map_err(|e| IterateError::invalid_option(option, value, e))?;

    if parsed <= T::default() {
        return Err(IterateError::invalid_option(
            option,
            value,
            "must be a positive integer",
        ));
    }

    Ok(parsed)
}

fn compile(option: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| IterateError::invalid_pattern(option, e))
}
