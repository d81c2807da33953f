//! Gateway Module
//!
//! Turns a named operation plus loosely typed parameters into a cached or
//! freshly fetched upstream answer.
//!
//! # Flow
//! 1. Resolve the operation and normalize parameters against its schema
//! 2. Derive the cache key from the material parameters only
//! 3. Serve from the cache, or call upstream with per-attempt timeout and
//!    bounded exponential backoff, caching the first success

mod fetch;
mod operation;
mod retry;
mod stats;


pub use fetch::{FetchGateway, Params, Payload};
pub use operation::{CacheKey, NormalizedRequest, Operation, ParamKind, ParamRole, ParamSpec};
pub(crate) use operation::biennium_start;
pub use retry::RetryPolicy;
pub use stats::{GatewayStats, GatewayStatsSnapshot};
