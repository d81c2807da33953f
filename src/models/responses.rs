//! Response DTOs for the tool server API

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::gateway::GatewayStatsSnapshot;
use crate::resources::ResourceTemplate;
use crate::tools::ToolInfo;

/// Response body for `POST /tools/:name`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResponse {
    pub tool: String,
    pub result: Value,
}

impl ToolCallResponse {
    pub fn new(tool: impl Into<String>, result: Value) -> Self {
        Self {
            tool: tool.into(),
            result,
        }
    }
}

/// Response body for `GET /tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolListResponse {
    pub server: String,
    pub tools: Vec<ToolInfo>,
}

/// Response body for `GET /resources`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceListResponse {
    pub templates: Vec<ResourceTemplate>,
}

/// Response body for `GET /resources/read`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReadResponse {
    pub uri: String,
    pub contents: Value,
}

/// Response body for `GET /stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub gateway: GatewayStatsSnapshot,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, gateway: GatewayStatsSnapshot) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            gateway,
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(service: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
