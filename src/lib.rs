//! WA Legislature response cache
//!
//! A tool server for Washington State Legislature data. Tool calls go
//! through a fetch gateway that normalizes requests into cache keys,
//! serves repeats from a TTL + LRU cache and retries transient upstream
//! failures with exponential backoff. Bill texts are also readable as
//! `bill://` resources.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod resources;
pub mod tasks;
pub mod tools;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::{CacheStats, CacheStore};
pub use config::Config;
pub use gateway::{FetchGateway, Params, Payload, RetryPolicy};
pub use tasks::spawn_cleanup_task;
pub use tools::ToolRegistry;
pub use upstream::{HttpTransport, Transport};
