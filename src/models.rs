// src/models.rs
// =============================================================================
// Data types shared by the store, the checker and the reconciler.
//
// - TrackedUrl: one URL we keep an eye on (written by whoever audits/views it)
// - StoredUrl: a tracked URL together with the key the store keeps it under
// - Page: one batch coming out of the paginator, plus where to resume
// - ValidationOutcome: the verdict for a single URL
// - RunSummary: what a full reconciliation pass produced
//
// It also holds the URL <-> document id transform. Ids are the serialized URL
// run through form-urlencoding, so they contain no '/' and sort the same way
// every time for the same logical URL.
// =============================================================================

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

// Encoded forms of "http://" and "https://". Every tracked id starts with one.
const HTTP_ID_PREFIX: &str = "http%3A%2F%2F";
const HTTPS_ID_PREFIX: &str = "https%3A%2F%2F";

/// A URL that has been audited or viewed at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedUrl {
    pub url: String,
    pub last_viewed: DateTime<Utc>,
    /// Set by the reconciler every time the URL is re-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<DateTime<Utc>>,
}

impl TrackedUrl {
    pub fn new(url: impl Into<String>, last_viewed: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            last_viewed,
            last_verified: None,
        }
    }
}

/// A document as it comes back from a range query: its store key plus data.
///
/// The key is whatever the store holds, which is not always the id
/// `url_to_id` would build for `data.url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUrl {
    pub id: String,
    pub data: TrackedUrl,
}

/// One batch from the paginator.
///
/// `cursor` is the id of the last document the store returned so far; pass
/// it back as `start_after` to continue. Once `complete` is true the batch is
/// empty and no further pages follow.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub urls: Vec<StoredUrl>,
    pub cursor: Option<String>,
    pub complete: bool,
}

impl Page {
    pub fn finished(cursor: Option<String>) -> Self {
        Self {
            urls: Vec::new(),
            cursor,
            complete: true,
        }
    }
}

/// Verdict for one URL, produced exactly once per URL in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub url: String,
    pub ok: bool,
}

/// Accumulated result of one paginate-and-validate pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub num_removed: usize,
    pub all_urls: Vec<TrackedUrl>,
}

/// Turns a URL into its document id.
///
/// The URL is parsed first so `HTTP://Example.com` and `http://example.com/`
/// end up with the same id. Only http and https URLs are accepted.
pub fn url_to_id(raw: &str) -> Result<String> {
    let parsed = parse_web_url(raw)?;
    Ok(form_urlencoded::byte_serialize(parsed.as_str().as_bytes()).collect())
}

/// Recovers the URL a document id was built from.
pub fn id_to_url(id: &str) -> String {
    // form_urlencoded::parse works on "k=v" pairs, so an id with no '=' comes
    // back as a single key with an empty value.
    form_urlencoded::parse(id.as_bytes())
        .map(|(key, _)| key.into_owned())
        .next()
        .unwrap_or_default()
}

/// Cheap shape check used to skip non-URL documents sharing the collection.
pub fn looks_like_url_id(id: &str) -> bool {
    id.starts_with(HTTP_ID_PREFIX) || id.starts_with(HTTPS_ID_PREFIX)
}

/// Parses a URL and rejects anything that is not http/https with a host.
pub fn parse_web_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw.trim()).map_err(|e| anyhow!("Invalid URL '{}': {}", raw, e))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(anyhow!("Not a web URL: {}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_has_no_slashes() {
        let id = url_to_id("https://example.com/a/b?c=d").unwrap();
        assert!(!id.contains('/'));
        assert!(looks_like_url_id(&id));
    }

    #[test]
    fn test_same_logical_url_same_id() {
        let a = url_to_id("HTTP://Example.com").unwrap();
        let b = url_to_id("http://example.com/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_reverses_to_url() {
        let id = url_to_id("https://example.com/path?q=1&r=two words").unwrap();
        assert_eq!(id_to_url(&id), "https://example.com/path?q=1&r=two%20words");
    }

    #[test]
    fn test_rejects_non_web_urls() {
        assert!(url_to_id("mailto:someone@example.com").is_err());
        assert!(url_to_id("b.com").is_err());
        assert!(url_to_id("").is_err());
    }

    #[test]
    fn test_looks_like_url_id_filters_other_docs() {
        assert!(!looks_like_url_id("__meta__"));
        assert!(!looks_like_url_id("stats"));
        assert!(looks_like_url_id(&url_to_id("http://a.com").unwrap()));
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = RunSummary {
            num_removed: 2,
            all_urls: vec![],
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"numRemoved":2,"allUrls":[]}"#);
    }
}
