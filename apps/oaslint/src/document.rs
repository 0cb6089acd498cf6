//! Loading OpenAPI documents from disk or over HTTP.

use crate::config::is_url;
use crate::error::{Error, Result};
use serde_json::Value as Json;
use std::fs;
use std::path::Path;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A parsed document together with its raw text.
pub struct Document {
    pub reference: String,
    pub text: String,
    pub root: Json,
}

/// Read `reference` (path relative to `base`, or an http(s) URL) and parse it.
pub fn load(base: &Path, reference: &str) -> Result<Document> {
    let text = if is_url(reference) {
        fetch(reference)?
    } else {
        fs::read_to_string(base.join(reference)).map_err(|source| Error::Read {
            reference: reference.to_string(),
            source,
        })?
    };
    let root = parse(reference, &text)?;
    Ok(Document {
        reference: reference.to_string(),
        text,
        root,
    })
}

fn fetch(url: &str) -> Result<String> {
    tracing::debug!(%url, "fetching document");
    let fetch_err = |e: reqwest::Error| Error::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(fetch_err)
}

/// Parse JSON when the text looks like a JSON object, YAML otherwise.
/// The root must be a mapping.
pub fn parse(reference: &str, text: &str) -> Result<Json> {
    let parse_err = |message: String| Error::Parse {
        reference: reference.to_string(),
        message,
    };
    let value: Json = if text.trim_start().starts_with('{') {
        serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?
    } else {
        serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?
    };
    if !value.is_object() {
        return Err(parse_err("document root is not a mapping".into()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_json_and_yaml() {
        let j = parse("a.json", r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(j["openapi"], "3.0.0");
        let y = parse("a.yaml", "openapi: 3.0.0\ninfo:\n  title: x\n").unwrap();
        assert_eq!(y["info"]["title"], "x");
    }

    #[test]
    fn test_parse_rejects_scalar_root() {
        let err = parse("a.yaml", "just a string").unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = load(dir.path(), "missing.yaml").err().unwrap();
        assert!(matches!(err, Error::Read { .. }));
        assert!(err.to_string().contains("missing.yaml"));
    }
}
