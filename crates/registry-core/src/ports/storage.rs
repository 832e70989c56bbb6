//! Storage traits for persistence

use crate::types::{ReceivedUser, RegisteredUser};
use crate::Result;
use async_trait::async_trait;

/// Durable store of record for registered and received users.
///
/// The `add_*` operations are insert-or-ignore: inserting an existing
/// username succeeds without changing a row. Lookups distinguish absence
/// (`Ok(None)`) from query failure (`Err`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add_registered(&self, username: &str) -> Result<()>;
    async fn get_registered(&self, username: &str) -> Result<Option<RegisteredUser>>;
    async fn add_received(&self, username: &str) -> Result<()>;
    async fn list_received(&self) -> Result<Vec<ReceivedUser>>;
}

/// Advisory key/value cache. Never authoritative: a stale or absent entry
/// is not an error for callers.
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
}
