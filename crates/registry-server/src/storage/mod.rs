//! Storage adapters
//!
//! PostgreSQL is the store of record; Redis is the advisory read cache.
//! Both are constructed once at startup and shared by every task.

pub mod cache;
pub mod db;
pub mod memory;

pub use cache::RedisCache;
pub use db::Database;
