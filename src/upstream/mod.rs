//! Upstream Module
//!
//! The boundary to the legislature's public services: the [`Transport`]
//! trait the gateway calls through, the request shape it passes, and the
//! HTTP implementation used in production. Three services sit behind it:
//! the ASMX web service, the bill document file server and the full-text
//! search.

pub mod documents;
mod http;
mod search;
mod xml;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

pub use documents::{BillFormat, Chamber};
pub use http::HttpTransport;
pub use search::parse_search_results;
pub use xml::xml_to_json;

// == Endpoint ==
/// Upstream methods: one per web service method, plus the document file
/// server and the full-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetLegislation,
    GetLegislationByYear,
    GetDocuments,
    GetAmendments,
    GetCommittees,
    GetCommitteeMeetings,
    GetSponsors,
    /// One bill text file; query carries biennium, chamber, billNumber, format
    BillDocument,
    /// Full-text search; query carries query, biennium, maxDocs
    KeywordSearch,
}

impl Endpoint {
    /// Path of a web service method below the service root. `None` for
    /// endpoints served elsewhere.
    pub fn path(&self) -> Option<&'static str> {
        let path = match self {
            Endpoint::GetLegislation => "/LegislationService.asmx/GetLegislation",
            Endpoint::GetLegislationByYear => "/LegislationService.asmx/GetLegislationByYear",
            Endpoint::GetDocuments => "/LegislativeDocumentService.asmx/GetDocuments",
            Endpoint::GetAmendments => "/AmendmentService.asmx/GetAmendments",
            Endpoint::GetCommittees => "/CommitteeService.asmx/GetCommittees",
            Endpoint::GetCommitteeMeetings => "/CommitteeMeetingService.asmx/GetCommitteeMeetings",
            Endpoint::GetSponsors => "/SponsorService.asmx/GetSponsors",
            Endpoint::BillDocument | Endpoint::KeywordSearch => return None,
        };
        Some(path)
    }
}

// == Upstream Request ==
/// A fully normalized upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub endpoint: Endpoint,
    /// Query parameters in the upstream's own naming
    pub query: Vec<(&'static str, String)>,
}

impl UpstreamRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            query: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    /// Value of a query parameter, if set.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

// == Transport ==
/// Performs one upstream attempt.
///
/// Implementations report failures already classified; retry, timeout and
/// caching are the gateway's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: &UpstreamRequest) -> Result<Value, TransportError>;
}
