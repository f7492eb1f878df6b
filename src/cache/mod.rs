//! Shared cache store
//!
//! The single resource shared by all collectors and by the request-serving
//! endpoints that read it. The protocol is deliberately tiny:
//! `get(key) -> value | absent` and `set(key, value, ttl)`.
//!
//! Freshness invariant: a read after the entry's TTL has elapsed returns
//! absent, never a stale value, regardless of backend.

mod memory;
mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value store with per-entry time-to-live
///
/// Collectors only ever write whole entries under their own key; there are
/// no partial updates and no cross-key operations, so backends need nothing
/// beyond atomic per-key get/set.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value if it is still fresh
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value with a fresh time-to-live
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}
