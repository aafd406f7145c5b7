//! The data container: one store handle and one cache handle per process.

use std::sync::Arc;

use duplex_core::{DuplexError, DuplexResult};

use crate::cache::{CounterCache, MemoryCache, RedisCache};
use crate::config::{CacheDriver, DataConfig, StoreDriver};
use crate::store::{MemoryStore, PgStore, Store};

/// Shared handles to both backends.
///
/// Cloning is cheap; every clone points at the same pool and connection.
#[derive(Clone)]
pub struct Data {
    store: Arc<dyn Store>,
    cache: Arc<dyn CounterCache>,
}

impl Data {
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn CounterCache>) -> Self {
        Self { store, cache }
    }

    /// Open the store, then the cache.
    ///
    /// Either failure is fatal. A store that came up before the cache failed
    /// is dropped on return, which closes its pool.
    pub async fn connect(config: &DataConfig) -> DuplexResult<Self> {
        let store: Arc<dyn Store> = match config.store.driver {
            StoreDriver::Postgres => Arc::new(PgStore::connect(&config.store).await.map_err(|e| {
                tracing::error!(error = %e, "failed opening store");
                DuplexError::from(e)
            })?),
            StoreDriver::Memory => {
                tracing::warn!("using in-memory store; data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let cache: Arc<dyn CounterCache> = match config.cache.driver {
            CacheDriver::Redis => Arc::new(RedisCache::connect(&config.cache).await.map_err(|e| {
                tracing::error!(error = %e, addr = %config.cache.addr, "failed opening cache");
                DuplexError::from(e)
            })?),
            CacheDriver::Memory => {
                tracing::warn!("using in-memory cache; like counters will not survive a restart");
                Arc::new(MemoryCache::new())
            }
        };

        Ok(Self { store, cache })
    }

    /// Both backends in process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCache::new()))
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<dyn CounterCache> {
        &self.cache
    }

    /// Ping both backends; the first failure wins.
    pub async fn ping(&self) -> DuplexResult<()> {
        self.store.ping().await?;
        self.cache.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, StoreConfig};
    use duplex_core::{Backend, StorageError};
    use std::time::Duration;

    #[tokio::test]
    async fn test_in_memory_config_connects() -> DuplexResult<()> {
        let data = Data::connect(&DataConfig::in_memory()).await?;
        data.ping().await
    }

    #[tokio::test]
    async fn test_cache_failure_is_fatal() {
        let config = DataConfig {
            store: StoreConfig {
                driver: StoreDriver::Memory,
                ..StoreConfig::default()
            },
            cache: CacheConfig {
                addr: "127.0.0.1:1".to_string(),
                dial_timeout: Duration::from_millis(300),
                ..CacheConfig::default()
            },
        };
        let result = Data::connect(&config).await;
        assert!(matches!(
            result,
            Err(DuplexError::Storage(StorageError::Connection { backend: Backend::Cache, .. }))
                | Err(DuplexError::Storage(StorageError::Timeout { backend: Backend::Cache, .. }))
        ));
    }
}
