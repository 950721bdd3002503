//! Query request envelope sent to VNDB endpoints.

use serde::{Serialize, Serializer};

use super::filter::FilterExpr;

/// Default `results` value for new requests
pub const DEFAULT_RESULTS_LIMIT: u32 = 100;

/// A VNDB query body.
///
/// Optional keys are omitted from the JSON entirely when unset so that the
/// service applies its own defaults.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub filters: FilterExpr,

    /// Requested field paths, sent comma-joined
    #[serde(serialize_with = "join_fields")]
    pub fields: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,

    #[serde(rename = "results", skip_serializing_if = "Option::is_none")]
    pub results_limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_filters: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_filters: Option<bool>,
}

fn join_fields<S: Serializer>(fields: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&fields.join(", "))
}

impl QueryRequest {
    /// Create a request with the default results limit
    pub fn new<I, F>(filters: FilterExpr, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            filters,
            fields: fields.into_iter().map(Into::into).collect(),
            sort: None,
            reverse: None,
            results_limit: Some(DEFAULT_RESULTS_LIMIT),
            page: None,
            count: None,
            compact_filters: None,
            normalized_filters: None,
        }
    }

    /// Set the sort key
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Set the sort key if one is given
    pub fn sort_opt(mut self, sort: Option<&str>) -> Self {
        self.sort = sort.map(str::to_string);
        self
    }

    /// Reverse the sort order
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    /// Set maximum results per page
    pub fn results_limit(mut self, limit: u32) -> Self {
        self.results_limit = Some(limit);
        self
    }

    /// Set page number (1-based)
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Ask the service to include the total match count
    pub fn count(mut self, count: bool) -> Self {
        self.count = Some(count);
        self
    }

    /// Ask the service to echo the filters in compact form
    pub fn compact_filters(mut self, compact: bool) -> Self {
        self.compact_filters = Some(compact);
        self
    }

    /// Ask the service to echo the filters in normalized form
    pub fn normalized_filters(mut self, normalized: bool) -> Self {
        self.normalized_filters = Some(normalized);
        self
    }

    /// Serialize to the request body
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
