//! Key-value cache adapter.
//!
//! The cache holds integer counters keyed by string. Absence is reported as
//! `None`, never as an error; what absence *means* is decided by the caller.

mod memory;
mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use async_trait::async_trait;

use crate::store::StorageResult;

/// Integer counters in a shared cache.
///
/// Implementations must be safe for concurrent use and must make `incr`
/// atomic with respect to concurrent increments on the same key.
#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Read the counter under `key`. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<i64>>;

    /// Add one to the counter under `key`, creating it at 1 when absent.
    /// Returns the new value.
    async fn incr(&self, key: &str) -> StorageResult<i64>;

    /// Round-trip to the backend (readiness checks).
    async fn ping(&self) -> StorageResult<()>;
}
