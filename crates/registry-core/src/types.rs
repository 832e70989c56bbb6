//! Domain types for the user registry.
//!
//! Registered and received users live in disjoint namespaces: a username can
//! appear in one, both, or neither. There is no referential integrity between
//! them because the two arrival paths are independent.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Namespace prefix for cache keys, shared with any other tenant of the
/// same cache instance.
pub const CACHE_KEY_PREFIX: &str = "userCacheKey";

/// A user registered through the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
}

/// A user recorded from the broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedUser {
    pub username: String,
}

/// Cache key for a registered user.
pub fn cache_key(username: &str) -> String {
    format!("{CACHE_KEY_PREFIX}:{username}")
}

/// Presence check on a username. Absent or empty names are rejected; no
/// further sanitization is applied.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(RegistryError::Validation(
            "username must not be empty".to_string(),
        ));
    }
    Ok(())
}
