//! Mapping of canonical URLs to local markdown files.

use crate::error::{ExportError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

pub const MARKDOWN_EXTENSION: &str = "md";
pub const FALLBACK_NAME: &str = "page";
const ROOT_MARKER: &str = "index";

/// Canonical URL -> local file, built once after discovery.
pub type PathMap = BTreeMap<String, PathBuf>;

/// Derive the local path for one canonical URL.
///
/// Distinct URLs can sanitize to the same name; `build_path_map` is the
/// collision-aware entry point.
pub fn map_path(canonical: &str, output_root: &Path) -> PathBuf {
    output_root.join(format!("{}.{}", base_name(canonical), MARKDOWN_EXTENSION))
}

/// Build the URL -> path table for a whole crawl.
///
/// URLs are assigned in sorted order. A URL whose name is already taken gets
/// a short hash of its canonical form appended, so the mapping is
/// deterministic and injective.
pub fn build_path_map<'a, I>(urls: I, output_root: &Path) -> Result<PathMap>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut sorted: Vec<&String> = urls.into_iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut taken: HashSet<String> = HashSet::new();
    let mut map = PathMap::new();

    for url in sorted {
        let mut path = map_path(url, output_root);

        if taken.contains(&path_key(&path)) {
            let base = base_name(url);
            let hash = short_hash(url);
            path = output_root.join(format!("{}_{}.{}", base, hash, MARKDOWN_EXTENSION));
            let mut counter = 2;
            while taken.contains(&path_key(&path)) {
                path = output_root.join(format!(
                    "{}_{}_{}.{}",
                    base, hash, counter, MARKDOWN_EXTENSION
                ));
                counter += 1;
            }
        }

        taken.insert(path_key(&path));
        map.insert(url.clone(), path);
    }

    verify_injective(&map)?;
    Ok(map)
}

/// Fail if two URLs share a local path (compared case-insensitively).
pub fn verify_injective(map: &PathMap) -> Result<()> {
    let mut owners: HashMap<String, &String> = HashMap::new();

    for (url, path) in map {
        if let Some(first) = owners.insert(path_key(path), url) {
            return Err(ExportError::PathCollision {
                path: path.clone(),
                first: first.clone(),
                second: url.clone(),
            });
        }
    }

    Ok(())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

fn base_name(canonical: &str) -> String {
    let Ok(url) = Url::parse(canonical) else {
        return sanitize(canonical);
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(host) = url.host_str() {
        parts.push(host.to_string());
    }

    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if let Some(last) = segments.pop() {
        segments.push(strip_html_extension(last));
    }

    if segments.is_empty() {
        parts.push(ROOT_MARKER.to_string());
    } else {
        parts.extend(segments.iter().map(|s| s.to_string()));
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        parts.push(query.to_string());
    }

    sanitize(&parts.join("_"))
}

fn strip_html_extension(segment: &str) -> &str {
    let lower = segment.to_ascii_lowercase();
    for ext in [".html", ".htm"] {
        if lower.ends_with(ext) && segment.len() > ext.len() {
            return &segment[..segment.len() - ext.len()];
        }
    }
    segment
}

/// Replace anything outside `[A-Za-z0-9_-]` with `_`, collapse runs and trim.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn short_hash(url: &str) -> String {
    format!("{:016x}", xxh3_64(url.as_bytes()))[..8].to_string()
}
