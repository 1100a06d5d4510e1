pub mod canonical;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod result;
pub mod scope;

pub use canonical::{canonicalize, canonicalize_url};
pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use extract::extract_links;
pub use fetch::{FetchConfig, HttpFetcher, PageFetcher};
pub use result::{DiscoveryResult, FetchFailure, FrontierEntry};
pub use scope::{in_scope, resolve_root};
