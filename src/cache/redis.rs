//! Redis cache backend
//!
//! The shared backend in production: collectors write here and the
//! out-of-process request-serving endpoints read the same keys. TTL is
//! enforced server-side via `SET ... EX`, so the freshness invariant holds
//! for every reader of the store, not just this process.

use super::CacheStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed cache store
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to a redis instance, e.g. `redis://127.0.0.1:6379/0`
    ///
    /// The connection manager reconnects on its own; a dropped connection
    /// surfaces as a per-run cache failure, not a process failure.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::cache(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::cache(format!("redis connection failed: {e}")))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| Error::cache(format!("redis GET {key}: {e}")))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // EX rejects 0; a sub-second TTL still gets one second of freshness
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| Error::cache(format!("redis SET {key}: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}
