//! HTTP transport for the legislature's public services.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::DEFAULT_SEARCH_URL;
use crate::error::TransportError;
use crate::upstream::documents::{bill_document_url, DEFAULT_DOCUMENTS_BASE_URL};
use crate::upstream::search::{parse_search_results, search_envelope};
use crate::upstream::{xml_to_json, BillFormat, Chamber, Endpoint, Transport, UpstreamRequest};

/// Upstream error bodies are truncated to this many bytes.
const MAX_ERROR_BODY: usize = 512;

/// Result cap sent with a search when the request does not carry one.
const DEFAULT_MAX_DOCS: u32 = 50;

// == HTTP Transport ==
/// Issues GET requests against the service's ASMX endpoints and decodes
/// the XML answers into JSON. Bill documents are fetched as text from the
/// file server and searches are POSTed to the search service.
///
/// No client-level timeout is set; the gateway bounds every attempt.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    documents_url: String,
    search_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("wa_leg_cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_url(base_url.into()),
            documents_url: DEFAULT_DOCUMENTS_BASE_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }

    /// Root of the bill document file server.
    pub fn with_documents_url(mut self, url: impl Into<String>) -> Self {
        self.documents_url = trim_url(url.into());
        self
    }

    /// Full URL of the search method.
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    // == Web Service ==
    async fn call_service(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        let path = request.endpoint.path().ok_or_else(|| incomplete(request, "path"))?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, query = ?request.query, "calling upstream");

        let response = self
            .client
            .get(&url)
            .query(&request.query)
            .send()
            .await
            .map_err(classify)?;

        xml_to_json(&success_body(response).await?)
    }

    // == Bill Document ==
    async fn fetch_document(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        let biennium = request.param("biennium").ok_or_else(|| incomplete(request, "biennium"))?;
        let bill_number = request
            .param("billNumber")
            .ok_or_else(|| incomplete(request, "billNumber"))?;
        let chamber = request
            .param("chamber")
            .and_then(Chamber::parse_loose)
            .ok_or_else(|| incomplete(request, "chamber"))?;
        let format: BillFormat = request
            .param("format")
            .ok_or_else(|| incomplete(request, "format"))?
            .parse()
            .map_err(TransportError::Malformed)?;

        let url = bill_document_url(&self.documents_url, biennium, chamber, bill_number, format);
        debug!(%url, "fetching bill document");

        let response = self.client.get(&url).send().await.map_err(classify)?;
        Ok(Value::String(success_body(response).await?))
    }

    // == Search ==
    async fn search(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        let query = request.param("query").ok_or_else(|| incomplete(request, "query"))?;
        let biennium = request.param("biennium").ok_or_else(|| incomplete(request, "biennium"))?;
        let max_docs = request
            .param("maxDocs")
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_DOCS);

        let body = json!({
            "Query": query,
            "Bienniums": [biennium],
            "MaxDocs": max_docs,
            "SortBy": "Rank",
        });
        debug!(url = %self.search_url, %query, %biennium, "searching bill text");

        let response = self
            .client
            .post(&self.search_url)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let text = success_body(response).await?;
        let envelope: Value =
            serde_json::from_str(&text).map_err(|e| TransportError::Malformed(e.to_string()))?;
        let hits = parse_search_results(search_envelope(&envelope)?)?;
        Ok(Value::Array(hits))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        match request.endpoint {
            Endpoint::BillDocument => self.fetch_document(request).await,
            Endpoint::KeywordSearch => self.search(request).await,
            _ => self.call_service(request).await,
        }
    }
}

/// Body of a 2xx answer; anything else becomes a `Status` error with the
/// body truncated.
async fn success_body(response: Response) -> Result<String, TransportError> {
    let status = response.status();
    let mut body = response.text().await.map_err(classify)?;

    if !status.is_success() {
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn incomplete(request: &UpstreamRequest, missing: &str) -> TransportError {
    TransportError::Malformed(format!(
        "{:?} request is missing `{missing}`",
        request.endpoint
    ))
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Malformed(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SPONSORS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ArrayOfMember xmlns="http://WSLWebServices.leg.wa.gov/">
  <Member>
    <Id>31526</Id>
    <Name>Peter Abbarno</Name>
    <Agency>House</Agency>
    <Party>R</Party>
    <District>20</District>
  </Member>
</ArrayOfMember>"#;

    #[tokio::test]
    async fn test_call_decodes_xml() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/SponsorService.asmx/GetSponsors")
            .match_query(Matcher::UrlEncoded("biennium".into(), "2025-26".into()))
            .with_status(200)
            .with_header("content-type", "text/xml; charset=utf-8")
            .with_body(SPONSORS)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url()).unwrap();
        let request = UpstreamRequest::new(Endpoint::GetSponsors).with("biennium", "2025-26");

        let value = transport.call(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value[0]["name"], json!("Peter Abbarno"));
        assert_eq!(value[0]["district"], json!("20"));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/CommitteeService.asmx/GetCommittees")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let transport = HttpTransport::new(format!("{}/", server.url())).unwrap();
        let request = UpstreamRequest::new(Endpoint::GetCommittees).with("biennium", "2025-26");

        let err = transport.call(&request).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 503,
                body: "Service Unavailable".to_string()
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_client_error_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/LegislationService.asmx/GetLegislation")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("Missing parameter: billNumber.")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url()).unwrap();
        let request = UpstreamRequest::new(Endpoint::GetLegislation).with("biennium", "2025-26");

        let err = transport.call(&request).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_body_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/AmendmentService.asmx/GetAmendments")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<ArrayOfAmendment><Amendment>")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url()).unwrap();
        let request = UpstreamRequest::new(Endpoint::GetAmendments).with("year", "2025");

        let err = transport.call(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        // Port 9 (discard) is closed on test hosts.
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let request = UpstreamRequest::new(Endpoint::GetSponsors).with("biennium", "2025-26");

        let err = transport.call(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_bill_document_fetched_as_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/biennium/2025-26/Xml/Bills/House(%20| )Bills/1234\.xml$".into()),
            )
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body("<Bill><BillHeading>HOUSE BILL 1234</BillHeading></Bill>")
            .create_async()
            .await;

        let transport = HttpTransport::new("http://127.0.0.1:9")
            .unwrap()
            .with_documents_url(format!("{}/", server.url()));
        let request = UpstreamRequest::new(Endpoint::BillDocument)
            .with("biennium", "2025-26")
            .with("chamber", "House")
            .with("billNumber", "1234")
            .with("format", "xml");

        let value = transport.call(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value, json!("<Bill><BillHeading>HOUSE BILL 1234</BillHeading></Bill>"));
    }

    #[tokio::test]
    async fn test_missing_bill_document_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .with_body("The resource cannot be found.")
            .create_async()
            .await;

        let transport = HttpTransport::new("http://127.0.0.1:9")
            .unwrap()
            .with_documents_url(server.url());
        let request = UpstreamRequest::new(Endpoint::BillDocument)
            .with("biennium", "2025-26")
            .with("chamber", "Senate")
            .with("billNumber", "1234")
            .with("format", "htm");

        let err = transport.call(&request).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_incomplete_document_request() {
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let request = UpstreamRequest::new(Endpoint::BillDocument).with("biennium", "2025-26");

        let err = transport.call(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_search_posts_query_and_parses_rows() {
        let mut server = mockito::Server::new_async().await;
        let envelope = json!({
            "Success": true,
            "Response": concat!(
                r#"<div class="searchResultRowClass">"#,
                r#"<a id="1566-S" href="javascript:;" class="searchResultDisplayNameClass">1566-S</a>"#,
                "(2025-26)<br/>AN ACT Relating to transparency and accountability</div>"
            )
        });
        let mock = server
            .mock("POST", "/search")
            .match_body(Matcher::PartialJson(json!({
                "Query": "intelligence",
                "Bienniums": ["2025-26"],
                "MaxDocs": 25,
                "SortBy": "Rank"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope.to_string())
            .create_async()
            .await;

        let transport = HttpTransport::new("http://127.0.0.1:9")
            .unwrap()
            .with_search_url(format!("{}/search", server.url()));
        let request = UpstreamRequest::new(Endpoint::KeywordSearch)
            .with("query", "intelligence")
            .with("biennium", "2025-26")
            .with("maxDocs", "25");

        let value = transport.call(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value[0]["bill_id"], "1566-S");
        assert_eq!(value[0]["bill_number"], 1566);
    }

    #[tokio::test]
    async fn test_refused_search_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(r#"{"Success": false, "Response": "Error message"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new("http://127.0.0.1:9")
            .unwrap()
            .with_search_url(format!("{}/search", server.url()));
        let request = UpstreamRequest::new(Endpoint::KeywordSearch)
            .with("query", "intelligence")
            .with("biennium", "2025-26");

        let err = transport.call(&request).await.unwrap_err();
        assert_eq!(err, TransportError::Rejected("Error message".to_string()));
    }
}
