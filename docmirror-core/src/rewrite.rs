//! Rewriting of markdown links that point at other mirrored pages.

use crate::paths::PathMap;
use docmirror_scanner::canonicalize_url;
use regex::{Captures, Regex};
use std::path::{Component, Path};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

// The text may hold one nested image, as in `[![alt](src)](target)`
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\[(?P<text>(?:!\[[^\]]*\]\([^()\s]*\)|[^\]])*)\]\((?P<target>[^()\s]+)(?P<title>\s+"[^"]*")?\)"#,
    )
    .expect("markdown link pattern is valid")
});

/// Point links to discovered pages at their local files.
///
/// Targets that resolve to a key of `paths` become a relative path from the
/// current page's file; everything else is emitted byte-for-byte unchanged.
pub fn rewrite_links(content: &str, page_url: &str, paths: &PathMap) -> String {
    let Some(page_path) = paths.get(page_url) else {
        debug!("{} has no local path, leaving links untouched", page_url);
        return content.to_string();
    };
    let Ok(base) = Url::parse(page_url) else {
        return content.to_string();
    };
    let page_dir = page_path.parent().unwrap_or_else(|| Path::new(""));

    MARKDOWN_LINK
        .replace_all(content, |caps: &Captures| {
            let whole = &caps[0];
            let Some(m) = caps.get(0) else {
                return whole.to_string();
            };

            // Image syntax keeps its source
            if content[..m.start()].ends_with('!') {
                return whole.to_string();
            }

            match local_target(&caps["target"], &base, page_dir, paths) {
                Some(local) => {
                    let title = caps.name("title").map_or("", |t| t.as_str());
                    format!("[{}]({}{})", &caps["text"], local, title)
                }
                None => whole.to_string(),
            }
        })
        .into_owned()
}

fn local_target(target: &str, base: &Url, page_dir: &Path, paths: &PathMap) -> Option<String> {
    let (location, fragment) = match target.split_once('#') {
        Some((location, fragment)) => (location, Some(fragment)),
        None => (target, None),
    };

    // In-page anchors stay as they are
    if location.is_empty() {
        return None;
    }

    let resolved = base.join(location).ok()?;
    let canonical = canonicalize_url(resolved);
    let target_path = paths.get(&canonical)?;

    let mut relative = relative_path(page_dir, target_path)?;
    if let Some(fragment) = fragment {
        relative.push('#');
        relative.push_str(fragment);
    }
    Some(relative)
}

/// Relative path from `from_dir` to `to_file` with `/` separators on every platform.
pub fn relative_path(from_dir: &Path, to_file: &Path) -> Option<String> {
    let diff = pathdiff::diff_paths(to_file, from_dir)?;

    let parts: Vec<String> = diff
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let rel = relative_path(Path::new("out"), Path::new("sub/deeper/b.md")).unwrap();
        assert_eq!(rel, "../sub/deeper/b.md");
    }

    #[test]
    fn test_relative_path_same_directory() {
        let rel = relative_path(Path::new("out"), &PathBuf::from("out").join("b.md")).unwrap();
        assert_eq!(rel, "b.md");
    }
}
