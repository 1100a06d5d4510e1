use crate::error::{ExportError, Result};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_READER_ENDPOINT: &str = "https://r.jina.ai";
pub const DEFAULT_CONVERT_TIMEOUT_SECS: u64 = 60;
pub const API_KEY_ENV: &str = "JINA_AI_API_KEY";

/// Turns a page URL into markdown text.
pub trait ContentConverter {
    fn convert(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

impl<T: ContentConverter + Send + Sync> ContentConverter for Arc<T> {
    fn convert(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        (**self).convert(url)
    }
}

/// Settings for the reader API client.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ReaderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_READER_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_CONVERT_TIMEOUT_SECS),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Converter backed by a reader service that serves `{endpoint}/{page url}` as markdown.
#[derive(Clone)]
pub struct ReaderConverter {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ReaderConverter {
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    pub fn request_url(&self, page_url: &str) -> String {
        format!("{}/{}", self.endpoint, page_url)
    }
}

impl ContentConverter for ReaderConverter {
    fn convert(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        let request = self
            .client
            .get(self.request_url(url))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/markdown; charset=utf-8");
        let url = url.to_string();

        async move {
            debug!("Converting {}", url);
            let response = request.send().await.map_err(|e| ExportError::Convert {
                url: url.clone(),
                message: e.to_string(),
            })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ExportError::Convert {
                    url,
                    message: format!("HTTP {}: {}", status.as_u16(), body.trim()),
                });
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase();
            if content_type.contains("markdown") {
                debug!("Received markdown for {}", url);
            } else {
                debug!("Received {:?} for {}, using it as markdown", content_type, url);
            }

            let text = response.text().await.map_err(|e| ExportError::Convert {
                url: url.clone(),
                message: e.to_string(),
            })?;

            if text.trim().is_empty() {
                return Err(ExportError::EmptyContent(url));
            }

            Ok(text)
        }
    }
}
