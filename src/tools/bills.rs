//! Bill tools: lookup, status, search, full-text search, documents and
//! amendments.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use super::biennium::{current_biennium, current_year, first_year};
use super::{arg, arg_text, default_arg, field_matches, flag, flag_arg, items, require_arg, text};
use crate::error::ToolError;
use crate::gateway::{FetchGateway, Params};

/// The bill number as the caller spelled it, echoed back in results.
fn bill_number_arg(args: &Params) -> Result<Value, ToolError> {
    require_arg(args, "bill_number")?;
    Ok(arg(args, "bill_number").cloned().unwrap_or(Value::Null))
}

/// `"HB 1234"`, `"01234"` and `1234` all reduce to `"1234"`.
fn bill_digits(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() && !digits.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// First record of a legislation lookup, or a not-found error.
async fn lookup_bill(
    gateway: &FetchGateway,
    operation: &str,
    args: &mut Params,
) -> Result<(Value, Value, String), ToolError> {
    let bill_number = bill_number_arg(args)?;
    let biennium = default_arg(args, "biennium", current_biennium);
    info!(bill = %display(&bill_number), %biennium, "looking up bill");

    let payload = gateway.fetch(operation, args).await?;
    let record = items(&payload)
        .first()
        .map(|record| (*record).clone())
        .ok_or_else(|| {
            ToolError::NotFound(format!(
                "Bill {} not found in biennium {biennium}",
                display(&bill_number)
            ))
        })?;
    Ok((record, bill_number, biennium))
}

// == Bill Info ==
pub(super) async fn get_bill_info(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let (bill, bill_number, biennium) = lookup_bill(&gateway, "getBillInfo", &mut args).await?;

    let status = bill
        .get("current_status")
        .map(|status| text(status, "status"))
        .unwrap_or_else(|| json!(""));
    let companions = match bill.get("companions") {
        Some(Value::Null) | None => json!([]),
        Some(companions) => companions.clone(),
    };

    Ok(json!({
        "bill_number": bill_number,
        "biennium": biennium,
        "title": text(&bill, "long_description"),
        "short_description": text(&bill, "short_description"),
        "sponsor": text(&bill, "sponsor"),
        "status": status,
        "introduced_date": text(&bill, "introduced_date"),
        "companions": companions,
        "legal_title": text(&bill, "legal_title"),
        "active": flag(&bill, "active"),
        "agency": text(&bill, "original_agency"),
    }))
}

// == Bill Status ==
pub(super) async fn get_bill_status(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let (bill, bill_number, biennium) = lookup_bill(&gateway, "getBillStatus", &mut args).await?;
    let status = bill.get("current_status").cloned().unwrap_or_else(|| json!({}));

    Ok(json!({
        "bill_number": bill_number,
        "biennium": biennium,
        "current_status": text(&status, "status"),
        "status_date": text(&status, "action_date"),
        "history_line": text(&status, "history_line"),
        "amendments_exist": flag(&status, "amendments_exist"),
        "veto": flag(&status, "veto"),
        "partial_veto": flag(&status, "partial_veto"),
    }))
}

// == Search ==
pub(super) async fn search_bills(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let year = default_arg(&mut args, "year", current_year);
    let agency = arg_text(&args, "agency").filter(|agency| !agency.is_empty());
    let active_only = flag_arg(&args, "active_only");
    info!(%year, agency = ?agency, active_only, "searching bills");

    let payload = gateway.fetch("searchBills", &args).await?;
    let bills = items(&payload);
    if bills.is_empty() {
        return Err(ToolError::NotFound(format!("No bills found in year {year}")));
    }

    let matched: Vec<Value> = bills
        .into_iter()
        .filter(|bill| agency.as_deref().map_or(true, |a| field_matches(bill, "original_agency", a)))
        .filter(|bill| !active_only || bill.get("active") == Some(&Value::Bool(true)))
        .map(|bill| {
            json!({
                "bill_id": text(bill, "bill_id"),
                "bill_number": text(bill, "bill_number"),
                "agency": text(bill, "original_agency"),
                "active": flag(bill, "active"),
                "biennium": text(bill, "biennium"),
                "short_legislation_type": bill.get("short_legislation_type").cloned().unwrap_or_else(|| json!({})),
                "substitute_version": bill.get("substitute_version").cloned().unwrap_or_else(|| json!("0")),
                "engrossed_version": bill.get("engrossed_version").cloned().unwrap_or_else(|| json!("0")),
            })
        })
        .collect();

    Ok(json!({
        "year": year,
        "count": matched.len(),
        "bills": matched,
    }))
}

// == Full-Text Search ==
/// Hits returned when the caller does not cap them.
const DEFAULT_MAX_DOCS: u32 = 50;

pub(super) async fn search_bill_text(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let query = require_arg(&args, "query")?;
    let biennium = default_arg(&mut args, "biennium", current_biennium);
    default_arg(&mut args, "max_docs", || DEFAULT_MAX_DOCS.to_string());
    info!(%query, %biennium, "searching bill text");

    let payload = gateway.fetch("searchBillText", &args).await?;
    let hits = items(&payload);
    if hits.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No bills found matching '{query}' in biennium {biennium}"
        )));
    }

    let bills: Vec<Value> = hits
        .into_iter()
        .map(|hit| {
            json!({
                "bill_id": text(hit, "bill_id"),
                "bill_number": hit.get("bill_number").cloned().unwrap_or(Value::Null),
                "biennium": text(hit, "biennium"),
                "description": text(hit, "description"),
            })
        })
        .collect();

    Ok(json!({
        "query": query,
        "biennium": biennium,
        "count": bills.len(),
        "bills": bills,
    }))
}

// == Documents ==
pub(super) async fn get_bill_documents(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let bill_number = bill_number_arg(&args)?;
    let biennium = default_arg(&mut args, "biennium", current_biennium);
    let document_type = arg_text(&args, "document_type").filter(|t| !t.is_empty());
    info!(bill = %display(&bill_number), %biennium, "fetching bill documents");

    let payload = gateway.fetch("getBillDocuments", &args).await?;
    let documents = items(&payload);
    if documents.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No documents found for bill {} in biennium {biennium}",
            display(&bill_number)
        )));
    }

    let matched: Vec<Value> = documents
        .into_iter()
        .filter(|doc| document_type.as_deref().map_or(true, |t| field_matches(doc, "type", t)))
        .map(|doc| {
            json!({
                "name": text(doc, "name"),
                "type": text(doc, "type"),
                "class": text(doc, "class"),
                "pdf_url": text(doc, "pdf_url"),
                "htm_url": text(doc, "htm_url"),
                "description": text(doc, "description"),
                "bill_id": text(doc, "bill_id"),
                "biennium": text(doc, "biennium"),
                "short_friendly_name": text(doc, "short_friendly_name"),
                "long_friendly_name": text(doc, "long_friendly_name"),
            })
        })
        .collect();

    Ok(json!({
        "bill_number": bill_number,
        "biennium": biennium,
        "count": matched.len(),
        "documents": matched,
    }))
}

// == Amendments ==
pub(super) async fn get_bill_amendments(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let bill_number = bill_number_arg(&args)?;
    let wanted = bill_digits(&display(&bill_number));
    let year = default_arg(&mut args, "year", || first_year(&current_biennium()).to_string());
    info!(bill = %display(&bill_number), %year, "fetching bill amendments");

    let payload = gateway.fetch("getBillAmendments", &args).await?;
    let amendments: Vec<Value> = items(&payload)
        .into_iter()
        .filter(|amendment| {
            amendment
                .get("bill_number")
                .map(|number| bill_digits(&display(number)) == wanted)
                .unwrap_or(false)
        })
        .map(|amendment| {
            json!({
                "name": text(amendment, "name"),
                "bill_id": text(amendment, "bill_id"),
                "type": text(amendment, "type"),
                "sponsor_name": text(amendment, "sponsor_name"),
                "description": text(amendment, "description"),
                "floor_action": text(amendment, "floor_action"),
                "floor_action_date": text(amendment, "floor_action_date"),
                "htm_url": text(amendment, "htm_url"),
                "pdf_url": text(amendment, "pdf_url"),
                "agency": text(amendment, "agency"),
            })
        })
        .collect();

    if amendments.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No amendments found for bill {} in year {year}",
            display(&bill_number)
        )));
    }

    Ok(json!({
        "bill_number": bill_number,
        "year": year,
        "count": amendments.len(),
        "amendments": amendments,
    }))
}
