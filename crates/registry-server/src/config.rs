//! Process configuration, read from the environment at startup.

use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    pub redis_url: String,
    /// Pub/sub endpoint for the broadcast channel. Defaults to the cache
    /// endpoint; pub/sub still uses its own dedicated connection.
    pub broker_url: String,
    pub broadcast_channel: String,
    /// Cache entry lifetime. `None` means entries never expire.
    pub cache_ttl: Option<Duration>,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A missing required value is a startup failure; the process never runs
    /// in a degraded mode.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let redis_url = std::env::var("REDIS_URL").context("REDIS_URL must be set")?;
        let broker_url =
            std::env::var("BROKER_URL").unwrap_or_else(|_| redis_url.clone());
        let broadcast_channel = std::env::var("BROADCAST_CHANNEL")
            .unwrap_or_else(|_| "userExchange".to_string());
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let cache_ttl = match std::env::var("CACHE_TTL_SECS") {
            Ok(v) => {
                let secs: u64 = v.parse().context("CACHE_TTL_SECS must be an integer")?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(v) => {
                let secs: u64 = v
                    .parse()
                    .context("REQUEST_TIMEOUT_SECS must be an integer")?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            bind_address,
            database_url,
            redis_url,
            broker_url,
            broadcast_channel,
            cache_ttl,
            request_timeout,
        })
    }
}
