//! Response envelopes returned by VNDB.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::sources::SourceError;

/// A decoded page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePage<T> {
    /// Always `true` for a page produced by [`ResponsePage::decode`]
    pub success: bool,

    pub results: Vec<T>,

    /// Whether more pages are available
    pub more: bool,

    /// Failure code reported by the service, if any
    pub error_code: Option<String>,

    /// Total number of matches, only present when requested
    pub count: Option<u64>,

    pub compact_filters: Option<String>,

    pub normalized_filters: Option<serde_json::Value>,
}

// Raw wire shape. `results` and `more` are optional here so a missing key
// can be told apart from an explicit failure report.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    results: Option<Vec<T>>,
    more: Option<bool>,
    #[serde(default, alias = "code")]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    compact_filters: Option<String>,
    #[serde(default)]
    normalized_filters: Option<serde_json::Value>,
}

impl<T: DeserializeOwned> ResponsePage<T> {
    /// Decode a response body.
    ///
    /// An explicit `success: false` becomes [`SourceError::Service`] with the
    /// reported code. Anything else that lacks `results` or `more` is a
    /// decode error.
    pub fn decode(body: &[u8]) -> Result<Self, SourceError> {
        let envelope: Envelope<T> = serde_json::from_slice(body)?;

        if envelope.success == Some(false) {
            return Err(SourceError::Service {
                code: envelope.error_code.unwrap_or_else(|| "unknown".to_string()),
                message: envelope.message.unwrap_or_default(),
            });
        }

        let results = envelope
            .results
            .ok_or_else(|| SourceError::Decode("response has no 'results' key".to_string()))?;
        let more = envelope
            .more
            .ok_or_else(|| SourceError::Decode("response has no 'more' key".to_string()))?;

        Ok(Self {
            success: true,
            results,
            more,
            error_code: None,
            count: envelope.count,
            compact_filters: envelope.compact_filters,
            normalized_filters: envelope.normalized_filters,
        })
    }
}

impl<T> ResponsePage<T> {
    /// First result, if any
    pub fn first(&self) -> Option<&T> {
        self.results.first()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Database statistics from `GET /stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Total number of characters
    pub chars: u64,
    #[serde(default)]
    pub producers: u64,
    #[serde(default)]
    pub releases: u64,
    #[serde(default)]
    pub staff: u64,
    #[serde(default)]
    pub tags: u64,
    #[serde(default)]
    pub traits: u64,
    #[serde(default)]
    pub vn: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn test_decode_success_page() {
        let page: ResponsePage<Item> =
            ResponsePage::decode(br#"{"results":[{"id":"c1"},{"id":"c2"}],"more":true}"#).unwrap();

        assert!(page.success);
        assert!(page.more);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.first().unwrap().id, "c1");
        assert_eq!(page.count, None);
    }

    #[test]
    fn test_decode_missing_results_is_decode_error() {
        let err = ResponsePage::<Item>::decode(br#"{"more":false}"#).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));

        let err = ResponsePage::<Item>::decode(br#"{"results":[]}"#).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));

        let err = ResponsePage::<Item>::decode(b"not json").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn test_decode_explicit_failure_keeps_code() {
        let err = ResponsePage::<Item>::decode(
            br#"{"success":false,"code":"throttled","message":"slow down"}"#,
        )
        .unwrap_err();

        match err {
            SourceError::Service { code, message } => {
                assert_eq!(code, "throttled");
                assert_eq!(message, "slow down");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_stats_decode() {
        let stats: Stats = serde_json::from_str(
            r#"{"chars":112000,"producers":15000,"releases":100000,"staff":30000,"tags":2800,"traits":3000,"vn":50000}"#,
        )
        .unwrap();
        assert_eq!(stats.chars, 112000);
        assert_eq!(stats.vn, 50000);
    }
}
