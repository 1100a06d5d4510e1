//! Conversion of discovered pages into linked local markdown files.

use crate::convert::ContentConverter;
use crate::crawl::CrawlProgressCallback;
use crate::error::{ExportError, Result};
use crate::paths::{PathMap, build_path_map};
use crate::rewrite::rewrite_links;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options for an export run
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub workers: usize,
    /// Also write every converted page into this single file
    pub combined: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedPage {
    pub url: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPage {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub written: Vec<ExportedPage>,
    pub skipped: Vec<SkippedPage>,
    pub combined: Option<PathBuf>,
}

/// Convert every discovered page, rewrite its internal links and write it out.
///
/// Output directory preparation and path mapping are preconditions and abort
/// the run; a page that fails to convert or write is skipped.
pub async fn export_pages<C: ContentConverter>(
    discovered: &BTreeSet<String>,
    converter: &C,
    options: &ExportOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<ExportSummary> {
    prepare_output_dir(&options.output_dir).await?;
    let paths = build_path_map(discovered, &options.output_dir)?;

    let mut summary = ExportSummary {
        output_dir: options.output_dir.clone(),
        ..Default::default()
    };

    let total = paths.len();
    let progress_callback = progress_callback.as_ref();
    let converted: Vec<(String, Result<String>)> = stream::iter(paths.keys().cloned().enumerate())
        .map(|(idx, url)| async move {
            if let Some(callback) = progress_callback {
                callback(format!("Converting ({}/{}): {}", idx + 1, total, url));
            }
            let content = converter.convert(&url).await;
            (url, content)
        })
        .buffered(options.workers.max(1))
        .collect()
        .await;

    let mut combined_pages = Vec::new();

    for (url, content) in converted {
        let markdown = match content {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                summary.skipped.push(SkippedPage {
                    url,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match write_page(&url, &markdown, &paths).await {
            Ok(path) => summary.written.push(ExportedPage {
                url: url.clone(),
                path,
            }),
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                summary.skipped.push(SkippedPage {
                    url: url.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        }

        if options.combined.is_some() {
            combined_pages.push((url, markdown));
        }
    }

    if let Some(combined_path) = &options.combined
        && !combined_pages.is_empty()
    {
        tokio::fs::write(combined_path, combine_pages(&combined_pages))
            .await
            .map_err(|source| ExportError::Write {
                path: combined_path.clone(),
                source,
            })?;
        summary.combined = Some(combined_path.clone());
    }

    info!(
        "Export complete. {} pages written, {} skipped",
        summary.written.len(),
        summary.skipped.len()
    );

    Ok(summary)
}

/// Create the output directory once, before any page is written.
pub async fn prepare_output_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| ExportError::OutputDir {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_page(url: &str, markdown: &str, paths: &PathMap) -> Result<PathBuf> {
    let Some(path) = paths.get(url) else {
        return Err(ExportError::Convert {
            url: url.to_string(),
            message: "no local path assigned".to_string(),
        });
    };

    let rewritten = rewrite_links(markdown, url, paths);
    tokio::fs::write(path, rewritten)
        .await
        .map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path.clone())
}

/// Concatenate pages into one document, each introduced by its source URL.
pub fn combine_pages(pages: &[(String, String)]) -> String {
    pages
        .iter()
        .map(|(url, content)| format!("\n\n--- Page Source: {} ---\n\n{}", url, content))
        .collect::<Vec<_>>()
        .join("\n")
}
