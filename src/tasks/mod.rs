//! Background Tasks Module
//!
//! - Expiry sweep: purges expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
