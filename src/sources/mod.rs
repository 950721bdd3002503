//! Remote metadata sources and the transport they run over.
//!
//! The [`Transport`] trait is the only way a client reaches the network.
//! [`HttpTransport`] is the production implementation; [`MockTransport`]
//! scripts responses for tests.
//!
//! # Cancellation
//!
//! Every lookup is an `async fn`. Dropping the future cancels the in-flight
//! request; records are only handed back by value once every request for a
//! lookup has completed, so a cancelled lookup never leaves a partially
//! enriched record behind.

mod http;
pub mod mock;
pub mod vndb;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedCall};
pub use vndb::{RoleGroup, VndbClient};

use async_trait::async_trait;
use std::time::Duration;

/// Raw request/response capability used by every client.
///
/// Implementations resolve `path` against their own endpoint and return the
/// response body. Non-success responses are reported as
/// [`SourceError::Service`]; connection failures and timeouts as
/// [`SourceError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// POST a JSON body
    async fn post(&self, path: &str, body: Vec<u8>, timeout: Duration)
        -> Result<Vec<u8>, SourceError>;

    /// GET without a body
    async fn get(&self, path: &str, timeout: Duration) -> Result<Vec<u8>, SourceError>;
}

/// Errors that can occur when querying a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport failure, including timeouts
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A well-formed response with no matching records
    #[error("No content")]
    NoContent,

    /// The service reported a failure
    #[error("Service error {code}: {message}")]
    Service { code: String, message: String },

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    /// Whether this is the "nothing matched" outcome
    pub fn is_no_content(&self) -> bool {
        matches!(self, SourceError::NoContent)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::Service {
            code: "400".to_string(),
            message: "Unknown field 'foo'".to_string(),
        };
        assert_eq!(err.to_string(), "Service error 400: Unknown field 'foo'");
        assert_eq!(SourceError::NoContent.to_string(), "No content");
    }

    #[test]
    fn test_is_no_content() {
        assert!(SourceError::NoContent.is_no_content());
        assert!(!SourceError::Decode("x".to_string()).is_no_content());
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err: SourceError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
