//! Redis cache layer

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use registry_core::ports::UserCache;
use registry_core::RegistryError;

/// Advisory read cache for registered users.
///
/// Entries have no expiry unless a TTL was configured; the durable store
/// remains the source of truth either way.
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Option<Duration>,
}

impl RedisCache {
    pub async fn new(redis_url: &str, ttl: Option<Duration>) -> anyhow::Result<Self> {
        tracing::info!("Connecting to Redis...");

        let client = redis::Client::open(redis_url).context("Invalid Redis URL")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!("Redis connection established");

        Ok(Self { conn, ttl })
    }
}

#[async_trait]
impl UserCache for RedisCache {
    async fn set(&self, key: &str, value: &str) -> registry_core::Result<()> {
        // ConnectionManager clones share the underlying multiplexed connection.
        let mut conn = self.conn.clone();

        match self.ttl {
            Some(ttl) => conn.set_ex(key, value, ttl.as_secs()).await,
            None => conn.set::<_, _, ()>(key, value).await,
        }
        .map_err(|e| RegistryError::Cache(e.to_string()))
    }

    async fn get(&self, key: &str) -> registry_core::Result<Option<String>> {
        let mut conn = self.conn.clone();

        conn.get(key)
            .await
            .map_err(|e| RegistryError::Cache(e.to_string()))
    }
}
