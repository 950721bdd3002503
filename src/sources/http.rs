//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

use super::{SourceError, Transport};
use crate::config::VndbConfig;

/// HTTP transport bound to one API endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Arc<Client>,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for `endpoint` with the default user agent
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_user_agent(
            endpoint,
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Create a transport with a custom user agent
    pub fn with_user_agent(
        endpoint: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::from_client(Arc::new(client), endpoint))
    }

    /// Create from configuration
    pub fn from_config(config: &VndbConfig) -> Result<Self, SourceError> {
        Self::with_user_agent(config.endpoint.clone(), &config.user_agent)
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint requests are resolved against
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn execute(&self, path: &str, builder: RequestBuilder) -> Result<Vec<u8>, SourceError> {
        let response = builder
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(format!("Failed to read {} response: {}", path, e)))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&bytes).trim().to_string();
            tracing::warn!(path, status = status.as_u16(), %message, "service returned an error");
            return Err(SourceError::Service {
                code: status.as_u16().to_string(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, SourceError> {
        let builder = self
            .client
            .post(self.build_url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .body(body);
        self.execute(path, builder).await
    }

    async fn get(&self, path: &str, timeout: Duration) -> Result<Vec<u8>, SourceError> {
        let builder = self.client.get(self.build_url(path)).timeout(timeout);
        self.execute(path, builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_joins_slashes() {
        let transport = HttpTransport::new("https://api.vndb.org/kana/").unwrap();
        assert_eq!(transport.endpoint(), "https://api.vndb.org/kana");
        assert_eq!(
            transport.build_url("/character"),
            "https://api.vndb.org/kana/character"
        );
        assert_eq!(transport.build_url("stats"), "https://api.vndb.org/kana/stats");
    }

    #[tokio::test]
    async fn test_post_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/character")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::JsonString(
                r#"{"filters":["id","=","c5"],"fields":"id"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"results":[],"more":false}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url()).unwrap();
        let body = transport
            .post(
                "/character",
                br#"{"filters":["id","=","c5"],"fields":"id"}"#.to_vec(),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(body, br#"{"results":[],"more":false}"#.to_vec());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_maps_to_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/vn")
            .with_status(400)
            .with_body("Unknown field 'nope'.\n")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url()).unwrap();
        let err = transport
            .post("/vn", b"{}".to_vec(), Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            SourceError::Service { code, message } => {
                assert_eq!(code, "400");
                assert_eq!(message, "Unknown field 'nope'.");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_stats() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stats")
            .with_status(200)
            .with_body(r#"{"chars":10}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url()).unwrap();
        let body = transport.get("/stats", Duration::from_secs(5)).await.unwrap();
        assert_eq!(body, br#"{"chars":10}"#.to_vec());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let err = transport
            .get("/stats", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)));
    }
}
