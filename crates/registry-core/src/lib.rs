//! Registry Core Library
//!
//! Domain types, error taxonomy, and storage ports for the user registry.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{RegistryError, Result};
pub use types::{cache_key, validate_username, ReceivedUser, RegisteredUser};
