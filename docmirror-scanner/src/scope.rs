use crate::error::{Result, ScanError};
use url::Url;

/// Compute the root scope prefix for a crawl.
///
/// `parent_level = 0` keeps the canonical start URL as the prefix. Larger
/// values drop that many trailing path segments, never going above the
/// domain root.
pub fn resolve_root(canonical_start: &str, parent_level: usize) -> Result<String> {
    if parent_level == 0 {
        return Ok(canonical_start.to_string());
    }

    let mut url = Url::parse(canonical_start)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", canonical_start, e)))?;

    if url.cannot_be_a_base() {
        return Err(ScanError::InvalidUrl(format!(
            "{} has no path to widen",
            canonical_start
        )));
    }

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    let keep = segments.len().saturating_sub(parent_level);

    let path = if keep == 0 {
        "/".to_string()
    } else {
        format!("/{}/", segments[..keep].join("/"))
    };

    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// A canonical URL is in scope iff it starts with the root prefix.
pub fn in_scope(canonical: &str, root_prefix: &str) -> bool {
    canonical.starts_with(root_prefix)
}
