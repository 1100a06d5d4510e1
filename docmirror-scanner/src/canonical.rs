//! URL canonicalization.
//!
//! Every URL that enters the crawl is reduced to one canonical string before it
//! is compared, deduplicated or tested against the root scope prefix. Two raw
//! URLs naming the same page (differing only in fragment, `index.html` suffix,
//! directory trailing slash or revision/action query parameters) map to the
//! same canonical string.

use crate::error::{Result, ScanError};
use url::Url;

/// Query keys carrying revision or action metadata rather than page identity.
pub const IGNORED_QUERY_KEYS: &[&str] = &["rev", "do", "action", "oldid", "diff"];

const INDEX_FILENAMES: &[&str] = &["index.html", "index.htm"];

/// Canonicalize a raw URL string.
pub fn canonicalize(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", raw, e)))?;
    Ok(canonicalize_url(url))
}

/// Canonicalize an already parsed URL.
pub fn canonicalize_url(mut url: Url) -> String {
    url.set_fragment(None);

    if url.cannot_be_a_base() {
        return url.to_string();
    }

    normalize_query(&mut url);

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.to_string()
}

fn normalize_query(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_ignored_key(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
        return;
    }

    pairs.sort();
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

fn is_ignored_key(key: &str) -> bool {
    IGNORED_QUERY_KEYS
        .iter()
        .any(|ignored| ignored.eq_ignore_ascii_case(key))
}

fn normalize_path(path: &str) -> String {
    let mut path = path.to_string();

    // Drop a trailing default index document, keeping its directory
    let last_segment = path.rsplit('/').next().unwrap_or("");
    if INDEX_FILENAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(last_segment))
    {
        path.truncate(path.len() - last_segment.len());
    }

    if path.is_empty() {
        path.push('/');
    }

    if path != "/" && !path.ends_with('/') {
        let last_segment = path.rsplit('/').next().unwrap_or("");
        if !last_segment.is_empty() && !last_segment.contains('.') {
            path.push('/');
        }
    }

    path
}
