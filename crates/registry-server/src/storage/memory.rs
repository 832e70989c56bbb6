//! In-memory port implementations using DashMap.
//!
//! Backs the test suite and local runs that have no PostgreSQL or Redis at
//! hand; semantics match the real adapters (idempotent inserts, unordered
//! listing).

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use registry_core::ports::{UserCache, UserStore};
use registry_core::{ReceivedUser, RegisteredUser};

#[derive(Default)]
pub struct MemoryStore {
    registered: DashSet<String>,
    received: DashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn add_registered(&self, username: &str) -> registry_core::Result<()> {
        self.registered.insert(username.to_string());
        Ok(())
    }

    async fn get_registered(
        &self,
        username: &str,
    ) -> registry_core::Result<Option<RegisteredUser>> {
        Ok(self.registered.get(username).map(|name| RegisteredUser {
            username: name.key().clone(),
        }))
    }

    async fn add_received(&self, username: &str) -> registry_core::Result<()> {
        self.received.insert(username.to_string());
        Ok(())
    }

    async fn list_received(&self) -> registry_core::Result<Vec<ReceivedUser>> {
        Ok(self
            .received
            .iter()
            .map(|name| ReceivedUser {
                username: name.key().clone(),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    data: DashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserCache for MemoryCache {
    async fn set(&self, key: &str, value: &str) -> registry_core::Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> registry_core::Result<Option<String>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let store = MemoryStore::new();

        store.add_registered("alice").await.unwrap();
        store.add_registered("alice").await.unwrap();

        let user = store.get_registered("alice").await.unwrap();
        assert_eq!(user.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let store = MemoryStore::new();

        store.add_registered("alice").await.unwrap();
        store.add_received("bob").await.unwrap();

        assert!(store.get_registered("bob").await.unwrap().is_none());
        let received = store.list_received().await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].username, "bob");
    }

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = MemoryCache::new();

        cache.set("userCacheKey:alice", "alice").await.unwrap();
        assert_eq!(
            cache.get("userCacheKey:alice").await.unwrap(),
            Some("alice".to_string())
        );
        assert_eq!(cache.get("userCacheKey:bob").await.unwrap(), None);
    }
}
