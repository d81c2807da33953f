//! Bill text tool.
//!
//! XML and HTML text is fetched through the gateway, so repeated reads of
//! one bill are served from the cache. PDFs are only linked.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::biennium::current_biennium;
use super::{arg, arg_text, items, require_arg};
use crate::error::{FetchError, ToolError};
use crate::gateway::{FetchGateway, Params};
use crate::upstream::documents::{
    bill_document_url, chamber_from_bill_id, extract_bill_number, validate_biennium,
    validate_bill_number, DEFAULT_DOCUMENTS_BASE_URL,
};
use crate::upstream::{BillFormat, Chamber};

/// Public file server link for one bill document.
pub(crate) fn document_link(biennium: &str, chamber: Chamber, bill_number: &str, format: BillFormat) -> String {
    bill_document_url(DEFAULT_DOCUMENTS_BASE_URL, biennium, chamber, bill_number, format)
}

/// Fetches one bill text through the gateway.
pub(crate) async fn fetch_bill_text(
    gateway: &FetchGateway,
    biennium: &str,
    chamber: Chamber,
    bill_number: &str,
    format: BillFormat,
) -> Result<String, FetchError> {
    let mut request = Params::new();
    request.insert("biennium".into(), json!(biennium));
    request.insert("chamber".into(), json!(chamber.as_str()));
    request.insert("bill_number".into(), json!(bill_number));
    request.insert("bill_format".into(), json!(format.as_str()));

    let payload = gateway.fetch("getBillContent", &request).await?;
    Ok(match payload.as_ref() {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

/// Chamber of origin from the bill's id, when the bill can be looked up.
async fn detect_chamber(gateway: &FetchGateway, biennium: &str, bill_number: &str) -> Option<Chamber> {
    let mut request = Params::new();
    request.insert("biennium".into(), json!(biennium));
    request.insert("bill_number".into(), json!(bill_number));

    match gateway.fetch("getBillInfo", &request).await {
        Ok(payload) => items(&payload)
            .first()
            .and_then(|bill| bill.get("bill_id"))
            .and_then(Value::as_str)
            .and_then(chamber_from_bill_id),
        Err(err) => {
            debug!(error = %err, bill = bill_number, "chamber lookup failed");
            None
        }
    }
}

// == Bill Content ==
/// Text of a bill in `xml` (default) or `htm`, or the link to its `pdf`.
///
/// Without a `chamber` the bill's id decides it; when that is unknown the
/// House is tried first, then the Senate.
pub(super) async fn get_bill_content(gateway: Arc<FetchGateway>, args: Params) -> Result<Value, ToolError> {
    let raw_number = require_arg(&args, "bill_number")?;
    let echoed_number = arg(&args, "bill_number").cloned().unwrap_or(Value::Null);
    let bill_number = extract_bill_number(&raw_number)
        .map(|digits| digits.trim_start_matches('0').to_string())
        .filter(|digits| validate_bill_number(digits))
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "Invalid bill number: {raw_number}. Must be 3-5 digits (e.g., 1234)"
            ))
        })?;

    let format: BillFormat = arg_text(&args, "bill_format")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| BillFormat::Xml.to_string())
        .parse()
        .map_err(ToolError::InvalidArguments)?;

    let biennium = arg_text(&args, "biennium")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(current_biennium);
    if !validate_biennium(&biennium) {
        return Err(ToolError::InvalidArguments(format!(
            "Invalid biennium format: {biennium}. Must be YYYY-YY starting with odd year (e.g., 2025-26)"
        )));
    }

    let chamber = match arg_text(&args, "chamber").filter(|value| !value.is_empty()) {
        Some(raw) => Some(Chamber::parse_loose(&raw).ok_or_else(|| {
            ToolError::InvalidArguments(format!("Invalid chamber: {raw}. Must be House or Senate"))
        })?),
        None => detect_chamber(&gateway, &biennium, &bill_number).await,
    };
    let candidates = chamber.map_or_else(|| Chamber::ALL.to_vec(), |chamber| vec![chamber]);
    info!(bill = %bill_number, %biennium, %format, chambers = ?candidates, "fetching bill content");

    let links = |chamber: Chamber| {
        (
            document_link(&biennium, chamber, &bill_number, BillFormat::Pdf),
            document_link(&biennium, chamber, &bill_number, BillFormat::Htm),
        )
    };

    if !format.is_fetched() {
        let chamber = candidates.first().copied().unwrap_or(Chamber::House);
        let (pdf_url, html_url) = links(chamber);
        return Ok(json!({
            "bill_number": echoed_number,
            "biennium": biennium,
            "chamber": chamber.as_str(),
            "format": format.as_str(),
            "url": pdf_url,
            "mime_type": format.mime_type(),
            "pdf_url": pdf_url,
            "html_url": html_url,
        }));
    }

    let mut last_error = None;
    for chamber in candidates {
        match fetch_bill_text(&gateway, &biennium, chamber, &bill_number, format).await {
            Ok(content) => {
                let (pdf_url, html_url) = links(chamber);
                return Ok(json!({
                    "bill_number": echoed_number,
                    "biennium": biennium,
                    "chamber": chamber.as_str(),
                    "format": format.as_str(),
                    "mime_type": format.mime_type(),
                    "content": content,
                    "url": document_link(&biennium, chamber, &bill_number, format),
                    "pdf_url": pdf_url,
                    "html_url": html_url,
                }));
            }
            Err(err) => {
                warn!(bill = %bill_number, %chamber, error = %err, "bill content unavailable");
                last_error = Some((chamber, err));
            }
        }
    }

    match last_error {
        Some((chamber, FetchError::Upstream { cause, .. })) if cause.is_not_found() => {
            Err(ToolError::NotFound(format!(
                "Bill {bill_number} not found in {chamber} for biennium {biennium}"
            )))
        }
        Some((_, err)) => Err(err.into()),
        None => Err(ToolError::NotFound(format!(
            "Bill {bill_number} not found in biennium {biennium}"
        ))),
    }
}
