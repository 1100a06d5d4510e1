use crate::canonical::canonicalize;
use crate::error::Result;
use crate::extract::extract_links;
use crate::fetch::{FetchConfig, HttpFetcher, PageFetcher};
use crate::result::{DiscoveryResult, FetchFailure, FrontierEntry};
use crate::scope::{in_scope, resolve_root};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Called with `(depth, url)` right before a page is fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Bounded-depth breadth-first discovery of a documentation tree.
///
/// The crawler owns the frontier, the visited-for-fetch set and the discovered
/// set for the duration of one `discover` call. Fetches inside one BFS wave may
/// run concurrently, but every visited check-and-insert happens here, on the
/// crawl task, in frontier order.
pub struct Crawler<F> {
    fetcher: F,
    max_depth: usize,
    parent_level: usize,
    workers: usize,
    progress_callback: Option<ProgressCallback>,
    frontier: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    discovered: BTreeSet<String>,
}

impl Crawler<HttpFetcher> {
    pub fn with_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(HttpFetcher::new(config)?))
    }
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_depth: 0,
            parent_level: 0,
            workers: 1,
            progress_callback: None,
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            discovered: BTreeSet::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_parent_level(mut self, level: usize) -> Self {
        self.parent_level = level;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Discover every in-scope page reachable from `start_url` within `max_depth` hops.
    ///
    /// Only an invalid start URL is an error; failed fetches are recorded in
    /// the result and the crawl carries on.
    pub async fn discover(&mut self, start_url: &str) -> Result<DiscoveryResult> {
        let start = canonicalize(start_url)?;
        let root_prefix = resolve_root(&start, self.parent_level)?;

        info!(
            "Starting discovery of {} (root {}, max depth {}, {} workers)",
            start, root_prefix, self.max_depth, self.workers
        );

        self.frontier.clear();
        self.visited.clear();
        self.discovered.clear();

        self.visited.insert(start.clone());
        self.frontier.push_back(FrontierEntry::new(start.clone(), 0));

        let mut result = DiscoveryResult::new(start, root_prefix.clone(), self.max_depth);

        while !self.frontier.is_empty() {
            // Entries are enqueued one depth at a time, so the whole frontier is one BFS wave
            let wave: Vec<FrontierEntry> = self
                .frontier
                .drain(..)
                .filter(|entry| {
                    let keep = in_scope(&entry.url, &root_prefix);
                    if !keep {
                        warn!("Dropping out-of-scope frontier entry {}", entry.url);
                    }
                    keep
                })
                .collect();

            for entry in &wave {
                self.discovered.insert(entry.url.clone());
            }

            for (entry, page) in self.fetch_wave(wave).await {
                result.fetched.push(entry.url.clone());

                let outcome = match page {
                    Ok(markup) => self.expand(&entry, &markup, &root_prefix),
                    Err(e) => Err(e),
                };

                if let Err(e) = outcome {
                    warn!("Failed to fetch links from {}: {}", entry.url, e);
                    result.failures.push(FetchFailure {
                        url: entry.url,
                        error: e.to_string(),
                    });
                }
            }
        }

        result.discovered = std::mem::take(&mut self.discovered);
        info!(
            "Discovery complete. {} pages discovered, {} fetched, {} failed",
            result.discovered.len(),
            result.fetched.len(),
            result.failures.len()
        );

        Ok(result)
    }

    /// Fetch one wave with at most `workers` requests in flight, preserving frontier order.
    async fn fetch_wave(&self, wave: Vec<FrontierEntry>) -> Vec<(FrontierEntry, Result<String>)> {
        let fetcher = &self.fetcher;
        let progress_callback = self.progress_callback.as_ref();

        stream::iter(wave)
            .map(|entry| async move {
                if let Some(callback) = progress_callback {
                    callback(entry.depth, entry.url.clone());
                }
                debug!("Fetching links from {} (depth {})", entry.url, entry.depth);
                let page = fetcher.fetch(&entry.url).await;
                (entry, page)
            })
            .buffered(self.workers)
            .collect()
            .await
    }

    /// Record the links found on a fetched page and enqueue the unvisited ones.
    fn expand(&mut self, entry: &FrontierEntry, markup: &str, root_prefix: &str) -> Result<()> {
        let raw_links = extract_links(markup, &entry.url, root_prefix)?;

        let mut links = BTreeSet::new();
        for raw in &raw_links {
            match canonicalize(raw) {
                Ok(link) => {
                    links.insert(link);
                }
                Err(e) => debug!("Ignoring link {}: {}", raw, e),
            }
        }

        for link in links {
            self.discovered.insert(link.clone());

            if entry.depth < self.max_depth
                && in_scope(&link, root_prefix)
                && self.visited.insert(link.clone())
            {
                debug!("Queuing {} at depth {}", link, entry.depth + 1);
                self.frontier
                    .push_back(FrontierEntry::new(link, entry.depth + 1));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    /// In-memory site that counts how often each page is requested.
    #[derive(Default)]
    struct StaticSite {
        pages: HashMap<String, String>,
        hits: Mutex<HashMap<String, usize>>,
    }

    impl StaticSite {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            let body: String = links
                .iter()
                .map(|href| format!(r#"<a href="{}">link</a>"#, href))
                .collect();
            self.pages
                .insert(url.to_string(), format!("<html><body>{}</body></html>", body));
            self
        }

        fn hits(&self, url: &str) -> usize {
            self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl PageFetcher for StaticSite {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
            *self.hits.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
            let page = self
                .pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScanError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                });
            async move { page }
        }
    }

    fn set(urls: &[&str]) -> BTreeSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    async fn html_page(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_end_to_end_discovery() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        html_page(
            &mock_server,
            "/guide/",
            format!(
                r#"<html><body>
                    <a href="{}/guide/intro.html">Intro</a>
                    <a href="https://other.example.com/">Elsewhere</a>
                </body></html>"#,
                base
            ),
        )
        .await;
        html_page(
            &mock_server,
            "/guide/intro.html",
            "<html><body>Intro</body></html>".to_string(),
        )
        .await;

        let mut crawler = Crawler::with_config(&FetchConfig::default())
            .unwrap()
            .with_max_depth(1);
        let result = crawler.discover(&format!("{}/guide/", base)).await.unwrap();

        assert_eq!(
            result.discovered,
            set(&[&format!("{}/guide/", base), &format!("{}/guide/intro.html", base)])
        );
        assert_eq!(result.fetched.len(), 2);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_depth_zero_records_direct_links_only() {
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/", &["a/", "b/"])
                .page("https://x/docs/a/", &["c/"]),
        );

        let mut crawler = Crawler::new(site.clone()).with_max_depth(0);
        let result = crawler.discover("https://x/docs/").await.unwrap();

        assert_eq!(
            result.discovered,
            set(&["https://x/docs/", "https://x/docs/a/", "https://x/docs/b/"])
        );
        assert_eq!(result.fetched, vec!["https://x/docs/".to_string()]);
        assert_eq!(site.hits("https://x/docs/a/"), 0);
    }

    #[tokio::test]
    async fn test_boundary_links_are_discovered_but_not_fetched() {
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/", &["a/"])
                .page("https://x/docs/a/", &["deep/"]),
        );

        let mut crawler = Crawler::new(site.clone()).with_max_depth(1);
        let result = crawler.discover("https://x/docs/").await.unwrap();

        assert!(result.discovered.contains("https://x/docs/a/deep/"));
        assert_eq!(site.hits("https://x/docs/a/deep/"), 0);
    }

    #[tokio::test]
    async fn test_cycle_is_fetched_once() {
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/a/", &["../b/"])
                .page("https://x/docs/b/", &["../a/"]),
        );

        let mut crawler = Crawler::new(site.clone())
            .with_max_depth(10)
            .with_parent_level(1);
        let result = crawler.discover("https://x/docs/a/").await.unwrap();

        assert_eq!(site.hits("https://x/docs/a/"), 1);
        assert_eq!(site.hits("https://x/docs/b/"), 1);
        assert_eq!(result.discovered, set(&["https://x/docs/a/", "https://x/docs/b/"]));
    }

    #[tokio::test]
    async fn test_cycle_over_http_is_fetched_once() {
        let mock_server = MockServer::start().await;

        // `expect(1)` is verified when the server is dropped
        html_page(
            &mock_server,
            "/docs/a/",
            r#"<a href="/docs/b/">B</a><a href="/docs/a/#top">Self</a>"#.to_string(),
        )
        .await;
        html_page(
            &mock_server,
            "/docs/b/",
            r#"<a href="/docs/a/index.html">A</a><a href="/docs/a">A again</a>"#.to_string(),
        )
        .await;

        let mut crawler = Crawler::with_config(&FetchConfig::default())
            .unwrap()
            .with_max_depth(5)
            .with_parent_level(1);
        let result = crawler
            .discover(&format!("{}/docs/a/", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(result.fetched.len(), 2);
    }

    #[tokio::test]
    async fn test_equivalent_links_are_fetched_once() {
        let site = Arc::new(StaticSite::default().page(
            "https://x/docs/",
            &["intro", "intro/", "intro/index.html", "intro#setup", "./intro/INDEX.HTM"],
        ));

        let mut crawler = Crawler::new(site.clone()).with_max_depth(3);
        let result = crawler.discover("https://x/docs/").await.unwrap();

        assert_eq!(result.discovered, set(&["https://x/docs/", "https://x/docs/intro/"]));
        assert_eq!(site.hits("https://x/docs/intro/"), 1);
    }

    #[tokio::test]
    async fn test_discovered_set_stays_in_scope() {
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/", &["/blog/", "/", "guide/", "https://y/docs/"])
                .page("https://x/docs/guide/", &["../../about/", "../reference/"]),
        );

        let mut crawler = Crawler::new(site).with_max_depth(5);
        let result = crawler.discover("https://x/docs/").await.unwrap();

        assert!(result.discovered.iter().all(|u| u.starts_with("https://x/docs/")));
        assert_eq!(
            result.discovered,
            set(&["https://x/docs/", "https://x/docs/guide/", "https://x/docs/reference/"])
        );
    }

    #[tokio::test]
    async fn test_parent_level_widens_scope() {
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/guide/", &["../api/", "../../blog/"])
                .page("https://x/docs/api/", &[]),
        );

        let mut crawler = Crawler::new(site.clone())
            .with_max_depth(1)
            .with_parent_level(1);
        let result = crawler.discover("https://x/docs/guide/").await.unwrap();

        assert_eq!(result.root_prefix, "https://x/docs/");
        assert_eq!(
            result.discovered,
            set(&["https://x/docs/api/", "https://x/docs/guide/"])
        );
        assert_eq!(site.hits("https://x/docs/api/"), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_fatal() {
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/", &["missing/", "ok/"])
                .page("https://x/docs/ok/", &["leaf/"]),
        );

        let mut crawler = Crawler::new(site).with_max_depth(2);
        let result = crawler.discover("https://x/docs/").await.unwrap();

        assert!(result.discovered.contains("https://x/docs/missing/"));
        assert!(result.discovered.contains("https://x/docs/ok/leaf/"));
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures.iter().any(|f| f.url == "https://x/docs/missing/"));
    }

    #[tokio::test]
    async fn test_unreachable_start_page_is_still_discovered() {
        let site = Arc::new(StaticSite::default());

        let mut crawler = Crawler::new(site).with_max_depth(2);
        let result = crawler.discover("https://x/docs").await.unwrap();

        assert_eq!(result.discovered, set(&["https://x/docs/"]));
        assert_eq!(result.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_depth_is_bfs_distance() {
        // c is reachable at depth 1 (from root) and depth 2 (via a)
        let site = Arc::new(
            StaticSite::default()
                .page("https://x/docs/", &["a/", "c/"])
                .page("https://x/docs/a/", &["../c/", "../d/"])
                .page("https://x/docs/c/", &[])
                .page("https://x/docs/d/", &[]),
        );

        let seen: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let mut crawler = Crawler::new(site)
            .with_max_depth(3)
            .with_workers(4)
            .with_progress_callback(Arc::new(move |depth, url| {
                seen_clone.lock().unwrap().push((depth, url));
            }));
        crawler.discover("https://x/docs/").await.unwrap();

        let seen = seen.lock().unwrap();
        let depth_of = |url: &str| seen.iter().find(|(_, u)| u == url).map(|(d, _)| *d);
        assert_eq!(depth_of("https://x/docs/"), Some(0));
        assert_eq!(depth_of("https://x/docs/a/"), Some(1));
        assert_eq!(depth_of("https://x/docs/c/"), Some(1));
        assert_eq!(depth_of("https://x/docs/d/"), Some(2));
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn test_worker_count_does_not_change_result() {
        let build = || {
            Arc::new(
                StaticSite::default()
                    .page("https://x/docs/", &["a/", "b/", "c/"])
                    .page("https://x/docs/a/", &["../b/", "x.html"])
                    .page("https://x/docs/b/", &["../c/", "y/"])
                    .page("https://x/docs/c/", &["../a/"]),
            )
        };

        let mut sequential = Crawler::new(build()).with_max_depth(4);
        let mut parallel = Crawler::new(build()).with_max_depth(4).with_workers(8);

        let a = sequential.discover("https://x/docs/").await.unwrap();
        let b = parallel.discover("https://x/docs/").await.unwrap();

        assert_eq!(a.discovered, b.discovered);
        assert_eq!(a.fetched, b.fetched);
    }

    #[tokio::test]
    async fn test_discover_resets_state_between_runs() {
        let site = Arc::new(StaticSite::default().page("https://x/docs/", &["a/"]));
        let mut crawler = Crawler::new(site.clone()).with_max_depth(1);

        let first = crawler.discover("https://x/docs/").await.unwrap();
        let second = crawler.discover("https://x/docs/").await.unwrap();

        assert_eq!(first.discovered, second.discovered);
        assert_eq!(site.hits("https://x/docs/"), 2);
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let mut crawler = Crawler::new(Arc::new(StaticSite::default()));
        let result = crawler.discover("not a url").await;
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }
}
