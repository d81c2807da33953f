//! Bill document resources.
//!
//! A bill document is addressed by URI:
//! `bill://document/{format}/{biennium}/{chamber}/{bill_number}`, or the
//! shorter `bill://xml/...`, `bill://htm/...` and `bill://pdf/...` forms.
//! XML and HTML reads go through the gateway; PDFs are only linked.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ToolError;
use crate::gateway::FetchGateway;
use crate::tools::content::{document_link, fetch_bill_text};
use crate::upstream::documents::{validate_biennium, validate_bill_number, validate_chamber};
use crate::upstream::{BillFormat, Chamber};

const SCHEME: &str = "bill://";

// == Templates ==
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ResourceTemplate {
    pub uri_template: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

pub const BILL_DOCUMENT_TEMPLATES: [ResourceTemplate; 4] = [
    ResourceTemplate {
        uri_template: "bill://document/{format}/{biennium}/{chamber}/{bill_number}",
        name: "Washington State Legislature Bill Documents",
        description: "Bills in XML, HTM or PDF format. format=xml|htm|pdf, \
                      biennium=YYYY-YY, chamber=House|Senate, bill_number=numeric",
        mime_type: "application/xml",
    },
    ResourceTemplate {
        uri_template: "bill://xml/{biennium}/{chamber}/{bill_number}",
        name: "Washington State Legislature Bill XML",
        description: "Bill text as structured XML.",
        mime_type: "application/xml",
    },
    ResourceTemplate {
        uri_template: "bill://htm/{biennium}/{chamber}/{bill_number}",
        name: "Washington State Legislature Bill HTML",
        description: "Bill text as HTML with links to cited law.",
        mime_type: "text/html",
    },
    ResourceTemplate {
        uri_template: "bill://pdf/{biennium}/{chamber}/{bill_number}",
        name: "Washington State Legislature Bill PDF URLs",
        description: "Link to the bill PDF; the document itself is not fetched.",
        mime_type: "application/pdf",
    },
];

// == Bill Resource ==
/// A validated `bill://` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillResource {
    pub format: BillFormat,
    pub biennium: String,
    pub chamber: Chamber,
    pub bill_number: String,
}

impl BillResource {
    /// Parses and validates `uri`. The chamber is case-sensitive and the
    /// bill number takes no chamber prefix.
    pub fn parse(uri: &str) -> Result<Self, ToolError> {
        let unsupported = || {
            ToolError::InvalidArguments(format!(
                "Unsupported resource URI: {uri}. Expected bill://{{format}}/{{biennium}}/{{chamber}}/{{bill_number}}"
            ))
        };
        let path = uri.strip_prefix(SCHEME).ok_or_else(unsupported)?;
        let segments: Vec<&str> = path.split('/').collect();
        let (format, rest) = match segments.as_slice() {
            ["document", format, rest @ ..] => (*format, rest),
            [format, rest @ ..] => (*format, rest),
            [] => return Err(unsupported()),
        };
        let [biennium, chamber, bill_number] = rest else {
            return Err(unsupported());
        };

        let format: BillFormat = format.parse().map_err(ToolError::InvalidArguments)?;

        if !validate_biennium(biennium) {
            return Err(ToolError::InvalidArguments(format!(
                "Invalid biennium format: {biennium}. Must be YYYY-YY starting with odd year (e.g., 2025-26)"
            )));
        }
        let chamber = Some(*chamber)
            .filter(|raw| validate_chamber(raw))
            .and_then(Chamber::parse_loose)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!(
                    "Invalid chamber: {chamber}. Must be exactly 'House' or 'Senate' (case-sensitive)"
                ))
            })?;
        if !validate_bill_number(bill_number) {
            return Err(ToolError::InvalidArguments(format!(
                "Invalid bill number: {bill_number}. Must be 3-5 digits without prefixes (e.g., 1234 not HB1234)"
            )));
        }

        Ok(Self {
            format,
            biennium: biennium.to_string(),
            chamber,
            bill_number: bill_number.to_string(),
        })
    }

    pub fn url(&self) -> String {
        document_link(&self.biennium, self.chamber, &self.bill_number, self.format)
    }

    fn info(&self) -> Value {
        json!({
            "biennium": self.biennium,
            "chamber": self.chamber.as_str(),
            "bill_number": self.bill_number,
            "format": self.format.as_str(),
        })
    }
}

// == Read ==
/// Reads the document at `uri`.
///
/// A failed fetch is not an error: the answer carries the document URL and
/// the reason instead of the text.
pub async fn read_bill_document(gateway: &FetchGateway, uri: &str) -> Result<Value, ToolError> {
    let resource = BillResource::parse(uri)?;
    let url = resource.url();
    info!(%uri, "reading bill document");

    if !resource.format.is_fetched() {
        return Ok(json!({
            "url": url,
            "mime_type": resource.format.mime_type(),
            "bill_info": resource.info(),
            "description": format!(
                "PDF URL for {} Bill {} from the {} biennium",
                resource.chamber, resource.bill_number, resource.biennium
            ),
            "note": "Use the 'url' field to access the PDF document",
        }));
    }

    match fetch_bill_text(
        gateway,
        &resource.biennium,
        resource.chamber,
        &resource.bill_number,
        resource.format,
    )
    .await
    {
        Ok(text) => Ok(json!({
            "uri": uri,
            "mime_type": resource.format.mime_type(),
            "text": text,
        })),
        Err(err) => {
            warn!(%uri, error = %err, "bill document unavailable");
            Ok(json!({
                "url": url,
                "error": format!("Could not fetch content: {err}"),
                "bill_info": resource.info(),
                "note": "Document content unavailable, URL provided as fallback",
            }))
        }
    }
}
