//! Dictionary retrieval.
//!
//! The [`DictionaryFetcher`] trait hides the transport so the scan
//! orchestrator can run against canned dictionaries in tests. [`HttpFetcher`]
//! is the real implementation on top of `reqwest`.

use std::time::Duration;

use proofdict_config::record::{self, RawTerm};
use reqwest::Client;
use tracing::debug;

use crate::BoxFuture;
use crate::build_info;

/// Default timeout for a dictionary request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from fetching a remote dictionary.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed dictionary from {url}: {message}")]
    Parse { url: String, message: String },
}

/// Retrieves an ordered dictionary from a URL.
///
/// Uses `BoxFuture` for object safety (allows `Arc<dyn DictionaryFetcher>`).
pub trait DictionaryFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<RawTerm>, FetchError>>;
}

/// Fetches proofdict JSON over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(build_info::user_agent())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl DictionaryFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<RawTerm>, FetchError>> {
        Box::pin(async move {
            debug!(url = %url, "Fetching dictionary");

            let resp = self
                .client
                .get(url)
                .header("accept", "application/json")
                .send()
                .await
                .map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = resp.text().await.map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            let records = record::parse_records(&body).map_err(|e| FetchError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            debug!(url = %url, records = records.len(), "Dictionary fetched");
            Ok(records)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_parses_dictionary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dictionary.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"id": "r1", "expected": "the", "patterns": ["teh"], "tags": ["typo"]}]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/dictionary.json", server.uri());
        let records = fetcher.fetch(&url).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("r1"));
        assert_eq!(records[0].aliases, vec!["teh"]);
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("user-agent", build_info::user_agent().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let records = fetcher.fetch(&server.uri()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_reports_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_reports_connection_failure() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(500)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/dictionary.json").await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
