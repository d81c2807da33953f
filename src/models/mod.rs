//! Request and Response models for the tool server API
//!
//! DTOs for the HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{ResourceQuery, ToolCallRequest};
pub use responses::{
    ErrorResponse, HealthResponse, ResourceListResponse, ResourceReadResponse, StatsResponse,
    ToolCallResponse, ToolListResponse,
};
