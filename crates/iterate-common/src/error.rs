//! Error types for iterate

use thiserror::Error;

/// Result type alias for iterate operations
pub type Result<T> = std::result::Result<T, IterateError>;

/// Main error type for iterate
///
/// Configuration variants are raised at construction time. Walk, filter and
/// retry variants are surfaced through an iteration as a single error step.
#[derive(Error, Debug)]
pub enum IterateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to parse '{option}' parameter '{value}': {reason}")]
    InvalidOption {
        option: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse '{option}' parameter: {source}")]
    InvalidPattern {
        option: String,
        #[source]
        source: regex::Error,
    },

    #[error("URI is missing scheme: '{0}'")]
    MissingScheme(String),

    #[error("Unregistered scheme '{scheme}'. Registered schemes are: {registered}")]
    UnknownScheme { scheme: String, registered: String },

    #[error("Scheme '{0}' is already registered")]
    DuplicateScheme(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to walk '{uri}': {source}")]
    Walk {
        uri: String,
        #[source]
        source: Box<IterateError>,
    },

    #[error("Failed to walk '{uri}' after {attempts} attempts: {source}")]
    RetriesExhausted {
        uri: String,
        attempts: u32,
        #[source]
        source: Box<IterateError>,
    },
}

impl IterateError {
    /// Create an invalid option error
    pub fn invalid_option(
        option: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidOption {
            option: option.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(option: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            option: option.into(),
            source,
        }
    }

    /// Create an invalid URI error
    pub fn invalid_uri(uri: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            source,
        }
    }

    /// Create a read error for `path`
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Wrap an error raised while walking `uri`
    pub fn walk(uri: impl Into<String>, source: IterateError) -> Self {
        Self::Walk {
            uri: uri.into(),
            source: Box::new(source),
        }
    }

    /// Create a retries exhausted error
    pub fn retries_exhausted(uri: impl Into<String>, attempts: u32, source: IterateError) -> Self {
        Self::RetriesExhausted {
            uri: uri.into(),
            attempts,
            source: Box::new(source),
        }
    }

    /// Whether this error was raised while building an iterator rather than while iterating
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidUri { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidPattern { .. }
                | Self::MissingScheme(_)
                | Self::UnknownScheme { .. }
                | Self::DuplicateScheme(_)
        )
    }
}
