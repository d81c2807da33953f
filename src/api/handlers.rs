//! API Handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ToolError;
use crate::gateway::{FetchGateway, Params};
use crate::models::{
    HealthResponse, ResourceListResponse, ResourceQuery, ResourceReadResponse, StatsResponse,
    ToolCallRequest, ToolCallResponse, ToolListResponse,
};
use crate::resources::{read_bill_document, BILL_DOCUMENT_TEMPLATES};
use crate::tools::ToolRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<FetchGateway>,
    pub tools: Arc<ToolRegistry>,
    pub server_name: Arc<str>,
}

impl AppState {
    pub fn new(gateway: Arc<FetchGateway>, tools: ToolRegistry, server_name: &str) -> Self {
        Self {
            gateway,
            tools: Arc::new(tools),
            server_name: Arc::from(server_name),
        }
    }

    /// State with the full tool set, named after the configuration.
    pub fn from_config(config: &Config, gateway: Arc<FetchGateway>) -> Self {
        Self::new(gateway, ToolRegistry::with_default_tools(), &config.server_name)
    }
}

/// Handler for POST /tools/:name
///
/// An empty body calls the tool without arguments. Any other body must be
/// a valid [`ToolCallRequest`].
pub async fn call_tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolCallResponse>, ToolError> {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        Params::new()
    } else {
        Json::<ToolCallRequest>::from_bytes(&body)?.0.arguments
    };
    info!(tool = %name, "tool call");

    match state
        .tools
        .call(&name, Arc::clone(&state.gateway), arguments)
        .await
    {
        Ok(result) => Ok(Json(ToolCallResponse::new(name, result))),
        Err(err) => {
            warn!(tool = %name, error = %err, "tool call failed");
            Err(err)
        }
    }
}

/// Handler for GET /tools
pub async fn list_tools_handler(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        server: state.server_name.to_string(),
        tools: state.tools.list(),
    })
}

/// Handler for GET /resources
pub async fn list_resources_handler() -> Json<ResourceListResponse> {
    Json(ResourceListResponse {
        templates: BILL_DOCUMENT_TEMPLATES.to_vec(),
    })
}

/// Handler for GET /resources/read?uri=bill://...
pub async fn read_resource_handler(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<Json<ResourceReadResponse>, ToolError> {
    match read_bill_document(&state.gateway, &query.uri).await {
        Ok(contents) => Ok(Json(ResourceReadResponse {
            uri: query.uri,
            contents,
        })),
        Err(err) => {
            warn!(uri = %query.uri, error = %err, "resource read failed");
            Err(err)
        }
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.gateway.cache().stats(),
        state.gateway.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.server_name.as_ref()))
}
