pub mod convert;
pub mod crawl;
pub mod error;
pub mod export;
pub mod paths;
pub mod report;
pub mod rewrite;

pub use convert::{ContentConverter, ReaderConfig, ReaderConverter};
pub use crawl::{CrawlOptions, CrawlProgressCallback, execute_discovery, extract_url_path};
pub use error::ExportError;
pub use export::{ExportOptions, ExportSummary, export_pages};
pub use paths::{PathMap, build_path_map, map_path};
pub use rewrite::rewrite_links;
