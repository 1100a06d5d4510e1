use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A pending unit of crawl work: a canonical URL and its BFS distance from the start page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
}

impl FrontierEntry {
    pub fn new(url: String, depth: usize) -> Self {
        Self { url, depth }
    }
}

/// A page whose markup could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of a single `discover` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub start_url: String,
    pub root_prefix: String,
    pub max_depth: usize,
    pub discovered: BTreeSet<String>,
    /// Every URL whose markup was requested, in fetch order.
    pub fetched: Vec<String>,
    pub failures: Vec<FetchFailure>,
}

impl DiscoveryResult {
    pub fn new(start_url: String, root_prefix: String, max_depth: usize) -> Self {
        Self {
            start_url,
            root_prefix,
            max_depth,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }

    pub fn len(&self) -> usize {
        self.discovered.len()
    }
}
