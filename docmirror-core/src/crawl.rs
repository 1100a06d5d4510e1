use crate::error::Result;
use docmirror_scanner::{Crawler, DiscoveryResult, FetchConfig, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Options for configuring a discovery run
pub struct CrawlOptions {
    pub url: String,
    pub max_depth: usize,
    pub parent_level: usize,
    pub workers: usize,
    pub fetch: FetchConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Build a spinner for interactive runs
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Execute link discovery with the given options
pub async fn execute_discovery(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<DiscoveryResult> {
    let CrawlOptions {
        url,
        max_depth,
        parent_level,
        workers,
        fetch,
        show_progress_bars,
    } = options;

    let progress_bar = show_progress_bars.then(|| Arc::new(spinner("Starting discovery...")));
    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let internal_progress_callback: ProgressCallback = Arc::new(move |depth: usize, url: String| {
        let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref pb) = pb_clone {
            pb.set_message(format!(
                "Fetching links... {} pages (depth {}: {})",
                count,
                depth,
                extract_url_path(&url)
            ));
        }
        if let Some(ref callback) = progress_callback {
            callback(format!("Fetching links from: {} (depth {})", url, depth));
        }
    });

    let mut crawler = Crawler::with_config(&fetch)?
        .with_max_depth(max_depth)
        .with_parent_level(parent_level)
        .with_workers(workers)
        .with_progress_callback(internal_progress_callback);

    let result = crawler.discover(&url).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Discovery complete! {} pages fetched", total));
    }

    Ok(result?)
}
