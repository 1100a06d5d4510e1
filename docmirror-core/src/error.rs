use docmirror_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Conversion of {url} failed: {message}")]
    Convert { url: String, message: String },

    #[error("Converter returned no content for {0}")]
    EmptyContent(String),

    #[error("Cannot prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Local path {} would be shared by {first} and {second}", path.display())]
    PathCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
