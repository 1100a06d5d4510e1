// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{init_logging, parse_start_url, pick_api_key, resolve_api_key};

// Re-export discovery functionality from docmirror-core
pub use docmirror_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_discovery, extract_url_path};
