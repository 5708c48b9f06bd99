//! Caching layer for fast redirect lookups.
//!
//! - [`CacheService`] - Backend trait
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`CacheGuard`] - Capability-checked wrapper used by the rest of the crate;
//!   degrades to "miss" when no backend is reachable

mod guard;
mod redis_cache;
mod service;

pub use guard::{CacheGuard, spawn_reconnect};
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};

#[cfg(test)]
pub use service::MockCacheService;
