//! Request DTOs for the tool server API

use serde::Deserialize;

use crate::gateway::Params;

/// Request body for `POST /tools/:name`.
///
/// A missing `arguments` object means "no arguments".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    pub arguments: Params,
}

/// Query string of `GET /resources/read`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceQuery {
    pub uri: String,
}
