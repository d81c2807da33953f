//! Legislator lookup.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use super::biennium::current_biennium;
use super::{arg_text, default_arg, field_matches, items, text};
use crate::error::ToolError;
use crate::gateway::{FetchGateway, Params};

/// Lists legislators serving in a biennium. `chamber`, `party` and
/// `district` narrow the list; a filter matching nobody yields a count of 0.
pub(super) async fn find_legislator(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let biennium = default_arg(&mut args, "biennium", current_biennium);
    let filter = |name: &str| arg_text(&args, name).filter(|value| !value.is_empty());
    let chamber = filter("chamber");
    let party = filter("party");
    let district = filter("district");
    info!(%biennium, chamber = ?chamber, party = ?party, district = ?district, "finding legislators");

    let payload = gateway.fetch("findLegislator", &args).await?;
    let sponsors = items(&payload);
    if sponsors.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No legislators found for biennium {biennium}"
        )));
    }

    let legislators: Vec<Value> = sponsors
        .into_iter()
        .filter(|member| chamber.as_deref().map_or(true, |c| field_matches(member, "agency", c)))
        .filter(|member| party.as_deref().map_or(true, |p| field_matches(member, "party", p)))
        .filter(|member| district.as_deref().map_or(true, |d| field_matches(member, "district", d)))
        .map(|member| {
            json!({
                "id": text(member, "id"),
                "name": text(member, "name"),
                "long_name": text(member, "long_name"),
                "agency": text(member, "agency"),
                "acronym": text(member, "acronym"),
                "party": text(member, "party"),
                "district": text(member, "district"),
                "phone": text(member, "phone"),
                "email": text(member, "email"),
                "first_name": text(member, "first_name"),
                "last_name": text(member, "last_name"),
            })
        })
        .collect();

    Ok(json!({
        "biennium": biennium,
        "count": legislators.len(),
        "legislators": legislators,
    }))
}
