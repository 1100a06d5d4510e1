use crate::canonical::{canonicalize, canonicalize_url};
use crate::error::{Result, ScanError};
use crate::scope::in_scope;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// Extract same-site documentation links from a page.
///
/// Returned URLs are absolute but not canonicalized; filtering is done on
/// their canonical form.
pub fn extract_links(markup: &str, page_url: &str, root_prefix: &str) -> Result<BTreeSet<String>> {
    let base = Url::parse(page_url)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", page_url, e)))?;
    let page_canonical = canonicalize(page_url)?;

    let document = Html::parse_document(markup);
    let link_selector = Selector::parse("a[href]")
        .map_err(|e| ScanError::ParseError(format!("link selector: {}", e)))?;

    let mut links = BTreeSet::new();

    for element in document.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_href(&base, href) else {
            continue;
        };

        let canonical = canonicalize_url(absolute.clone());
        let Ok(candidate) = Url::parse(&canonical) else {
            continue;
        };

        if !matches!(candidate.scheme(), "http" | "https") {
            continue;
        }
        if !same_host(&candidate, &base) {
            debug!("Skipping cross-host link: {}", absolute);
            continue;
        }
        if canonical == page_canonical || !in_scope(&canonical, root_prefix) {
            continue;
        }
        if !looks_like_document(&candidate) {
            debug!("Skipping non-document link: {}", absolute);
            continue;
        }

        links.insert(absolute.to_string());
    }

    Ok(links)
}

fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    base.join(href).ok()
}

fn same_host(candidate: &Url, base: &Url) -> bool {
    candidate.host_str() == base.host_str()
        && candidate.port_or_known_default() == base.port_or_known_default()
}

/// Root-like paths, extension-less segments and `.html` pages count as documents.
fn looks_like_document(url: &Url) -> bool {
    let path = url.path().trim_matches('/');
    if path.is_empty() {
        return true;
    }

    let last_segment = path.rsplit('/').next().unwrap_or("");
    !last_segment.contains('.') || last_segment.ends_with(".html")
}
