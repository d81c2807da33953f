//! API Module
//!
//! HTTP handlers and routing for the tool server.
//!
//! # Endpoints
//! - `GET /tools` - List the registered tools
//! - `POST /tools/:name` - Invoke a tool
//! - `GET /resources` - List the bill document URI templates
//! - `GET /resources/read?uri=` - Read a `bill://` document
//! - `GET /stats` - Cache and gateway statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
