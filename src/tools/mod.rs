//! Tools Module
//!
//! The legislative tools exposed to clients, and the registry that maps a
//! tool name to its handler. The registry is built once at startup; tools
//! reach the upstream only through [`FetchGateway::fetch`].

mod biennium;
mod bills;
mod committees;
pub(crate) mod content;
mod legislators;
#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ToolError;
use crate::gateway::{FetchGateway, Params};

pub use biennium::{biennium_for, current_biennium, current_year};

/// Future returned by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;

/// A tool implementation: gateway plus arguments in, JSON result out.
pub type ToolHandler = fn(Arc<FetchGateway>, Params) -> ToolFuture;

// == Tool Info ==
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

struct Tool {
    description: &'static str,
    handler: ToolHandler,
}

// == Tool Registry ==
/// Name -> handler mapping.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Tool>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full legislative tool set.
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();
        registry.register(
            "get_bill_info",
            "Detailed information about a bill: title, sponsor, status, companions.",
            |g, a| -> ToolFuture { Box::pin(bills::get_bill_info(g, a)) },
        );
        registry.register(
            "get_bill_status",
            "Current status of a bill, with the latest history line and veto flags.",
            |g, a| -> ToolFuture { Box::pin(bills::get_bill_status(g, a)) },
        );
        registry.register(
            "search_bills",
            "Bills introduced in a year, optionally filtered by agency and active status.",
            |g, a| -> ToolFuture { Box::pin(bills::search_bills(g, a)) },
        );
        registry.register(
            "search_bill_text",
            "Full-text search of bill text in a biennium, ranked by relevance.",
            |g, a| -> ToolFuture { Box::pin(bills::search_bill_text(g, a)) },
        );
        registry.register(
            "get_bill_content",
            "Text of a bill as XML or HTML, or a link to its PDF.",
            |g, a| -> ToolFuture { Box::pin(content::get_bill_content(g, a)) },
        );
        registry.register(
            "get_bill_documents",
            "Bill text, amendment and report documents with HTML and PDF links.",
            |g, a| -> ToolFuture { Box::pin(bills::get_bill_documents(g, a)) },
        );
        registry.register(
            "get_bill_amendments",
            "Amendments filed against a bill in a given year.",
            |g, a| -> ToolFuture { Box::pin(bills::get_bill_amendments(g, a)) },
        );
        registry.register(
            "get_committees",
            "Standing committees of the House and Senate for a biennium.",
            |g, a| -> ToolFuture { Box::pin(committees::get_committees(g, a)) },
        );
        registry.register(
            "get_committee_meetings",
            "Committee meetings between two dates, optionally for one committee.",
            |g, a| -> ToolFuture { Box::pin(committees::get_committee_meetings(g, a)) },
        );
        registry.register(
            "find_legislator",
            "Legislators for a biennium, filterable by chamber, party and district.",
            |g, a| -> ToolFuture { Box::pin(legislators::find_legislator(g, a)) },
        );
        info!(count = registry.tools.len(), "tool registry built");
        registry
    }

    /// Adds or replaces a tool.
    pub fn register(&mut self, name: &'static str, description: &'static str, handler: ToolHandler) {
        self.tools.insert(
            name,
            Tool {
                description,
                handler,
            },
        );
    }

    /// Registered tools sorted by name.
    pub fn list(&self) -> Vec<ToolInfo> {
        let mut tools: Vec<ToolInfo> = self
            .tools
            .iter()
            .map(|(name, tool)| ToolInfo {
                name,
                description: tool.description,
            })
            .collect();
        tools.sort_by_key(|tool| tool.name);
        tools
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    // == Call ==
    /// Runs tool `name` with `args`.
    pub async fn call(
        &self,
        name: &str,
        gateway: Arc<FetchGateway>,
        args: Params,
    ) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        debug!(tool = name, "dispatching tool call");
        (tool.handler)(gateway, args).await
    }
}

// == Argument Helpers ==
/// Looks up an argument by case-insensitive name, treating `null` as absent.
fn arg<'a>(args: &'a Params, name: &str) -> Option<&'a Value> {
    args.iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
        .filter(|value| !value.is_null())
}

/// Argument rendered as trimmed text.
fn arg_text(args: &Params, name: &str) -> Option<String> {
    arg(args, name).map(|value| match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

/// Fills `name` with `default()` when absent or blank.
///
/// Every spelling of `name` is replaced, so the gateway never sees a blank
/// value next to the default.
fn default_arg(args: &mut Params, name: &str, default: impl FnOnce() -> String) -> String {
    if let Some(existing) = arg_text(args, name).filter(|value| !value.is_empty()) {
        return existing;
    }
    let value = default();
    args.retain(|key, _| !key.trim().eq_ignore_ascii_case(name));
    args.insert(name.to_string(), Value::String(value.clone()));
    value
}

fn require_arg(args: &Params, name: &str) -> Result<String, ToolError> {
    arg_text(args, name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("`{name}` is required")))
}

fn flag_arg(args: &Params, name: &str) -> bool {
    match arg(args, name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        _ => false,
    }
}

// == Payload Helpers ==
/// Items of an upstream list, looking through single-key wrapper objects.
fn items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) if map.len() == 1 => match map.values().next() {
            Some(inner @ (Value::Array(_) | Value::Object(_))) => items(inner),
            _ => vec![value],
        },
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

/// Field as a JSON string, empty when missing or null.
fn text(item: &Value, field: &str) -> Value {
    match item.get(field) {
        Some(Value::Null) | None => json!(""),
        Some(value) => value.clone(),
    }
}

fn flag(item: &Value, field: &str) -> Value {
    match item.get(field) {
        Some(Value::Bool(b)) => json!(b),
        _ => json!(false),
    }
}

/// Case-insensitive equality of a field against a filter value.
fn field_matches(item: &Value, field: &str, wanted: &str) -> bool {
    item.get(field)
        .and_then(Value::as_str)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(wanted.trim()))
}
