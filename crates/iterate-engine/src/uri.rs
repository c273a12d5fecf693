//! URI helpers shared by the registry, the dispatcher options and the sources

use iterate_common::{IterateError, Result};
use url::Url;

/// Placeholder written over secrets by [`scrub_uri`]
const SCRUBBED: &str = "...";

/// Query parameters whose values never reach a log line
const SECRET_PARAMS: &[&str] = &["access_token"];

fn parse(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => IterateError::MissingScheme(uri.to_string()),
        other => IterateError::invalid_uri(uri, other),
    })
}

/// Lower-cased scheme of `uri`
pub fn scheme(uri: &str) -> Result<String> {
    Ok(parse(uri)?.scheme().to_lowercase())
}

/// Decoded query parameters of `uri`, in order of appearance
pub fn query_pairs(uri: &str) -> Result<Vec<(String, String)>> {
    Ok(parse(uri)?
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Replace the values of secret query parameters with `...`
pub fn scrub_uri(uri: &str) -> Result<String> {
    let mut url = parse(uri)?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                SCRUBBED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    Ok(url.to_string())
}

/// Parse a boolean the way the iterator URI options spell them
pub fn parse_bool(option: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(IterateError::invalid_option(option, value, "expected a boolean")),
    }
}
