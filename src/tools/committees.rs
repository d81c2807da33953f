//! Committee tools.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use super::biennium::current_biennium;
use super::{arg_text, default_arg, flag, items, require_arg, text};
use crate::error::ToolError;
use crate::gateway::{FetchGateway, Params};

fn committee_summary(committee: &Value) -> Value {
    json!({
        "id": text(committee, "id"),
        "name": text(committee, "name"),
        "long_name": text(committee, "long_name"),
        "agency": text(committee, "agency"),
        "acronym": text(committee, "acronym"),
        "phone": text(committee, "phone"),
    })
}

pub(super) async fn get_committees(gateway: Arc<FetchGateway>, mut args: Params) -> Result<Value, ToolError> {
    let biennium = default_arg(&mut args, "biennium", current_biennium);
    info!(%biennium, "fetching committees");

    let payload = gateway.fetch("getCommittees", &args).await?;
    let committees: Vec<Value> = items(&payload).into_iter().map(committee_summary).collect();
    if committees.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No committees found for biennium {biennium}"
        )));
    }

    Ok(json!({
        "biennium": biennium,
        "count": committees.len(),
        "committees": committees,
    }))
}

pub(super) async fn get_committee_meetings(
    gateway: Arc<FetchGateway>,
    args: Params,
) -> Result<Value, ToolError> {
    let start_date = require_arg(&args, "start_date")?;
    let end_date = require_arg(&args, "end_date")?;
    let committee = arg_text(&args, "committee")
        .filter(|name| !name.is_empty())
        .map(|name| name.to_lowercase());
    info!(%start_date, %end_date, committee = ?committee, "fetching committee meetings");

    let payload = gateway.fetch("getCommitteeMeetings", &args).await?;
    let meetings = items(&payload);
    if meetings.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No meetings found between {start_date} and {end_date}"
        )));
    }

    let matched: Vec<Value> = meetings
        .into_iter()
        .filter_map(|meeting| {
            let committees: Vec<Value> = meeting
                .get("committees")
                .map(items)
                .unwrap_or_default()
                .into_iter()
                .map(committee_summary)
                .collect();

            if let Some(wanted) = &committee {
                let hosts = committees.iter().any(|c| {
                    c["name"]
                        .as_str()
                        .is_some_and(|name| name.to_lowercase().contains(wanted.as_str()))
                });
                if !hosts {
                    return None;
                }
            }

            Some(json!({
                "agenda_id": text(meeting, "agenda_id"),
                "agency": text(meeting, "agency"),
                "committees": committees,
                "room": text(meeting, "room"),
                "building": text(meeting, "building"),
                "address": text(meeting, "address"),
                "city": text(meeting, "city"),
                "state": text(meeting, "state"),
                "date": text(meeting, "date"),
                "cancelled": flag(meeting, "cancelled"),
                "committee_type": text(meeting, "committee_type"),
                "notes": text(meeting, "notes"),
            }))
        })
        .collect();

    Ok(json!({
        "start_date": start_date,
        "end_date": end_date,
        "count": matched.len(),
        "meetings": matched,
    }))
}
