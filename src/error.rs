//! Error types for the legislative cache service
//!
//! One enum per concern: startup configuration, upstream transport,
//! gateway fetches, and the user-facing tool layer.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Configuration Error ==
/// Invalid startup configuration. Fatal, never recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value parsed but is outside its allowed range
    #[error("invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// An environment variable could not be parsed
    #[error("could not parse {var}={value:?}")]
    Parse { var: String, value: String },
}

// == Transport Error ==
/// A classified failure from a single upstream attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt exceeded its timeout
    #[error("request timed out")]
    Timeout,

    /// Connection refused, reset, or otherwise broken mid-request
    #[error("connection failed: {0}")]
    Connection(String),

    /// The upstream answered with a non-success status
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The upstream answered, but the body could not be decoded
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// The upstream answered and reported the request as failed
    #[error("upstream rejected the request: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether a retry may succeed where this attempt failed.
    ///
    /// Timeouts, broken connections and 5xx answers are transient. 4xx
    /// answers, refusals and undecodable bodies will not change on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Timeout | TransportError::Connection(_) => true,
            TransportError::Status { status, .. } => (500..600).contains(status),
            TransportError::Malformed(_) | TransportError::Rejected(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Status { status: 404, .. })
    }
}

// == Fetch Error ==
/// Failure of a gateway fetch, surfaced to the tool layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No operation with this name exists
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Parameters do not fit the operation's schema
    #[error("invalid parameters for {operation}: {reason}")]
    InvalidRequest { operation: String, reason: String },

    /// Upstream failed non-transiently, or transiently on every attempt
    #[error("{operation} failed after {attempts} attempt(s): {cause}")]
    Upstream {
        operation: String,
        attempts: u32,
        cause: TransportError,
    },

    /// Upstream timed out on the final attempt
    #[error("{operation} timed out after {attempts} attempt(s)")]
    Timeout { operation: String, attempts: u32 },
}

impl FetchError {
    /// True for `Upstream` and its `Timeout` subtype.
    pub fn is_upstream(&self) -> bool {
        matches!(self, FetchError::Upstream { .. } | FetchError::Timeout { .. })
    }
}

// == Tool Error ==
/// User-facing failure of a tool invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments could not be used
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The upstream answered, but there is nothing matching
    #[error("{0}")]
    NotFound(String),

    /// The upstream could not be reached or refused the request
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// The request body is not a tool call
    #[error("{0}")]
    Body(#[from] JsonRejection),
}

// == IntoResponse Implementation ==
impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status = match &self {
            ToolError::UnknownTool(_) | ToolError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
            ToolError::NotFound(_) => StatusCode::NOT_FOUND,
            ToolError::Fetch(FetchError::UnknownOperation(_))
            | ToolError::Fetch(FetchError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
            ToolError::Fetch(FetchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ToolError::Fetch(FetchError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
            ToolError::Body(rejection) => rejection.status(),
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}
