//! VNDB (Kana API) character client.
//!
//! Character lookups take two round trips: `/character` returns the
//! character itself, and a second `/vn` query scoped to that character
//! recovers the voice-actor credits, which VNDB does not return inline.

mod enrich;
mod random;

pub use enrich::collect_voice_actors;
pub use random::RoleGroup;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, SamplerConfig, VndbConfig};
use crate::models::{
    CharacterRecord, FilterExpr, QueryRequest, ResponsePage, Stats, CHARACTER_FIELDS,
};
use crate::sources::{HttpTransport, SourceError, Transport};

/// Sort key for relevance-ranked searches
const SEARCH_RANK: &str = "searchrank";

/// VNDB character client
#[derive(Debug, Clone)]
pub struct VndbClient {
    transport: Arc<dyn Transport>,
    config: VndbConfig,
    sampler: SamplerConfig,
}

impl VndbClient {
    /// Create a client over `transport` with default settings
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, &Config::default())
    }

    /// Create a client over `transport` using `config`
    pub fn with_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            config: config.vndb.clone(),
            sampler: config.sampler.clone(),
        }
    }

    /// Create a client talking HTTP to the configured endpoint
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let transport = HttpTransport::from_config(&config.vndb)?;
        Ok(Self::with_config(Arc::new(transport), config))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Send a query and decode the result page
    async fn query<R: DeserializeOwned>(
        &self,
        path: &str,
        request: &QueryRequest,
    ) -> Result<ResponsePage<R>, SourceError> {
        let body = request
            .to_body()
            .map_err(|e| SourceError::InvalidRequest(format!("Failed to encode query: {}", e)))?;
        tracing::debug!(path, bytes = body.len(), "sending vndb query");

        let raw = self.transport.post(path, body, self.timeout()).await?;
        let page = ResponsePage::decode(&raw)?;
        tracing::debug!(path, results = page.results.len(), more = page.more, "decoded vndb page");
        Ok(page)
    }

    fn character_request(&self, filters: FilterExpr, sort: Option<&str>) -> QueryRequest {
        QueryRequest::new(filters, CHARACTER_FIELDS.iter().copied())
            .sort_opt(sort)
            .results_limit(self.config.results_limit)
    }

    /// Resolve a single character and attach its voice actors.
    ///
    /// The first result in the service's own ordering wins. An empty page is
    /// [`SourceError::NoContent`] and no enrichment query is made.
    pub async fn resolve(
        &self,
        filters: FilterExpr,
        sort: Option<&str>,
        max_results: u32,
    ) -> Result<CharacterRecord, SourceError> {
        let request = self.character_request(filters, sort).results_limit(max_results);
        let page: ResponsePage<CharacterRecord> = self.query("/character", &request).await?;

        let Some(record) = page.results.into_iter().next() else {
            return Err(SourceError::NoContent);
        };
        let id = record.id.clone();
        self.enrich(&id, record).await
    }

    /// Look up a character by VNDB id (e.g. `c17`)
    pub async fn character_by_id(&self, id: &str) -> Result<CharacterRecord, SourceError> {
        self.resolve(FilterExpr::eq("id", id), None, 1).await
    }

    /// Best fuzzy match for `keyword`
    pub async fn character_by_fuzzy(&self, keyword: &str) -> Result<CharacterRecord, SourceError> {
        self.resolve(FilterExpr::eq("search", keyword), Some(SEARCH_RANK), 1)
            .await
    }

    /// All fuzzy matches for `keyword`, without voice actors.
    ///
    /// An empty list is returned as-is.
    pub async fn character_list_by_fuzzy(
        &self,
        keyword: &str,
    ) -> Result<Vec<CharacterRecord>, SourceError> {
        let request = self.character_request(FilterExpr::eq("search", keyword), Some(SEARCH_RANK));
        let page: ResponsePage<CharacterRecord> = self.query("/character", &request).await?;
        Ok(page.results)
    }

    /// Database statistics
    pub async fn stats(&self) -> Result<Stats, SourceError> {
        let raw = self.transport.get("/stats", self.timeout()).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockTransport;
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;

    /// In-memory sink for formatted log lines
    #[derive(Clone, Default)]
    pub(super) struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        /// Route this thread's events at or above `level` into the capture
        pub(super) fn install(&self, level: tracing::Level) -> tracing::subscriber::DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub(super) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn client(mock: &Arc<MockTransport>) -> VndbClient {
        VndbClient::new(mock.clone())
    }

    #[tokio::test]
    async fn test_by_id_sends_exact_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post("/character", r#"{"results":[{"id":"c5","name":"A"}],"more":false}"#)
            .on_post("/vn", r#"{"results":[],"more":false}"#);

        let record = client(&mock).character_by_id("c5").await.unwrap();
        assert_eq!(record.id, "c5");

        let sent = mock.calls_to("/character")[0].json().unwrap();
        assert_eq!(sent["filters"], json!(["id", "=", "c5"]));
        assert_eq!(sent["results"], 1);
        assert!(sent.get("sort").is_none());
        assert!(sent["fields"].as_str().unwrap().starts_with("id, name, original"));
    }

    #[tokio::test]
    async fn test_fuzzy_uses_search_rank() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post("/character", r#"{"results":[{"id":"c9","name":"B"}],"more":true}"#)
            .on_post("/vn", r#"{"results":[],"more":false}"#);

        client(&mock).character_by_fuzzy("rei").await.unwrap();

        let sent = mock.calls_to("/character")[0].json().unwrap();
        assert_eq!(sent["filters"], json!(["search", "=", "rei"]));
        assert_eq!(sent["sort"], "searchrank");
    }

    #[tokio::test]
    async fn test_list_skips_enrichment() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post(
            "/character",
            r#"{"results":[{"id":"c1","name":"A"},{"id":"c2","name":"B"}],"more":false}"#,
        );

        let list = client(&mock).character_list_by_fuzzy("a").await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(mock.calls_to("/vn").is_empty());

        let sent = mock.calls_to("/character")[0].json().unwrap();
        assert_eq!(sent["results"], 100);
    }

    #[tokio::test]
    async fn test_list_empty_is_not_an_error() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post("/character", r#"{"results":[],"more":false}"#);
        assert!(client(&mock).character_list_by_fuzzy("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post_error("/character", SourceError::Transport("reset".to_string()));

        let err = client(&mock).character_by_id("c1").await.unwrap_err();
        assert!(matches!(err, SourceError::Transport(ref m) if m == "reset"));
    }

    #[tokio::test]
    async fn test_decode_error_passes_through() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post("/character", r#"{"oops":true}"#);

        let err = client(&mock).character_by_id("c1").await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
        assert!(mock.calls_to("/vn").is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get("/stats", r#"{"chars":42,"vn":7}"#);
        let stats = client(&mock).stats().await.unwrap();
        assert_eq!(stats.chars, 42);
        assert_eq!(stats.vn, 7);
    }
}
