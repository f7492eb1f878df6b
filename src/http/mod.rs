//! Bounded retry fetch
//!
//! Transport plumbing shared by every collector:
//! - Per-attempt timeout and a bounded retry count
//! - Configurable backoff (constant, linear, exponential) with a cap
//! - Retry only on transient failure classes (timeout, connect, 5xx, 429)
//! - Token-bucket rate limiting to keep retry policies polite
//!
//! This module has no knowledge of the data being fetched.

mod client;
mod rate_limit;

pub use client::{FetchClient, FetchConfig, FetchConfigBuilder, FetchRequest};
pub use rate_limit::RateLimit;
