//! Full-text bill search answers.
//!
//! The search service wraps an HTML fragment in a JSON envelope
//! (`{"Success": true, "Response": "<div ...>"}`). Each hit is one row:
//!
//! ```text
//! <div class="searchResultRowClass">
//!   <a id="1566-S" class="searchResultDisplayNameClass">1566-S</a>(2025-26)<br/>
//!   AN ACT Relating to ...
//! </div>
//! ```

use once_cell::sync::OnceCell;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use regex::Regex;
use serde_json::{json, Value};

use crate::error::TransportError;

static ROW: OnceCell<Regex> = OnceCell::new();
static HEADING: OnceCell<Regex> = OnceCell::new();
static TAG: OnceCell<Regex> = OnceCell::new();

fn compiled(cell: &'static OnceCell<Regex>, pattern: &str) -> Result<&'static Regex, TransportError> {
    cell.get_or_try_init(|| Regex::new(pattern))
        .map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Unwraps the search envelope. A `Success: false` answer is a refusal.
pub(crate) fn search_envelope(body: &Value) -> Result<&str, TransportError> {
    let response = body.get("Response").and_then(Value::as_str).unwrap_or_default();
    match body.get("Success").and_then(Value::as_bool) {
        Some(true) => Ok(response),
        Some(false) => Err(TransportError::Rejected(response.to_string())),
        None => Err(TransportError::Malformed(
            "search answer has no Success flag".to_string(),
        )),
    }
}

/// Hits of a search result fragment as `{bill_id, bill_number, biennium,
/// description}` objects. Rows without a numeric bill id are skipped.
pub fn parse_search_results(html: &str) -> Result<Vec<Value>, TransportError> {
    let row = compiled(
        &ROW,
        r#"(?is)<div[^>]*class="[^"]*searchResultRowClass[^"]*"[^>]*>(.*?)</div>"#,
    )?;
    let heading = compiled(
        &HEADING,
        r#"(?is)<a[^>]*>\s*([^<]+?)\s*</a>\s*\(\s*(\d{4}-\d{2})\s*\)(.*)"#,
    )?;
    let tag = compiled(&TAG, r"<[^>]+>")?;

    let mut hits = Vec::new();
    for captures in row.captures_iter(html) {
        let Some(inner) = captures.get(1) else { continue };
        let Some(parts) = heading.captures(inner.as_str()) else {
            continue;
        };

        let bill_id = decode(&parts[1]);
        let digits: String = bill_id.chars().take_while(char::is_ascii_digit).collect();
        let Ok(bill_number) = digits.parse::<u64>() else {
            continue;
        };

        let text = tag.replace_all(&parts[3], " ");
        let description = decode(&text).split_whitespace().collect::<Vec<_>>().join(" ");

        hits.push(json!({
            "bill_id": bill_id,
            "bill_number": bill_number,
            "biennium": &parts[2],
            "description": description,
        }));
    }
    Ok(hits)
}

/// Resolves character references, falling back to the raw text when the
/// fragment uses an entity XML does not know.
fn decode(raw: &str) -> String {
    unescape_with(raw, |entity| match entity {
        "nbsp" => Some(" "),
        other => resolve_predefined_entity(other),
    })
    .map(|text| text.into_owned())
    .unwrap_or_else(|_| raw.to_string())
}
