use crate::error::{Result, ScanError};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; docmirror/0.1)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings handed to the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Retrieves the markup of a single page.
///
/// Transport errors, timeouts and non-2xx statuses all surface as `Err`.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

impl<T: PageFetcher + Send + Sync> PageFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        (**self).fetch(url)
    }
}

/// `PageFetcher` over a pooled `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .connect_timeout(config.timeout / 2)
            .pool_max_idle_per_host(16)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        let request = self.client.get(url);
        let url = url.to_string();

        async move {
            debug!("Fetching {}", url);
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ScanError::HttpStatus {
                    url,
                    status: status.as_u16(),
                });
            }

            Ok(response.text().await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/guide/"))
            .and(header("user-agent", "docmirror-test/1.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html>ok</html>"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig {
            user_agent: "docmirror-test/1.0".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let body = fetcher
            .fetch(&format!("{}/guide/", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing/", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_millis(100),
        })
        .unwrap();

        let result = fetcher.fetch(&format!("{}/slow/", mock_server.uri())).await;
        assert!(matches!(result, Err(ScanError::HttpError(_))));
    }
}
