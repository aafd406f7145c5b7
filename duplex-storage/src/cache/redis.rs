//! Redis counter cache.

use std::future::Future;
use std::time::Duration;

use ::redis::aio::{ConnectionLike, ConnectionManager, ConnectionManagerConfig};
use ::redis::{AsyncCommands, RedisError};
use async_trait::async_trait;
use duplex_core::{Backend, StorageError};
use tracing::Instrument;

use super::CounterCache;
use crate::config::CacheConfig;
use crate::store::StorageResult;

/// Counter cache backed by a multiplexed, auto-reconnecting Redis connection.
///
/// `ConnectionManager` is cheap to clone; every call works on its own clone
/// so concurrent requests never serialize on a lock.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl RedisCache {
    /// Dial the server and verify it answers `PING`.
    pub async fn connect(config: &CacheConfig) -> StorageResult<Self> {
        let client = ::redis::Client::open(config.connection_url()).map_err(cache_error)?;
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.dial_timeout)
            .set_response_timeout(config.read_timeout.max(config.write_timeout));

        let manager = tokio::time::timeout(
            config.dial_timeout,
            ConnectionManager::new_with_config(client, manager_config),
        )
        .await
        .map_err(|_| StorageError::Timeout {
            backend: Backend::Cache,
            operation: "dial",
        })?
        .map_err(cache_error)?;

        let cache = Self {
            manager,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        };
        cache.ping().await?;
        tracing::info!(addr = %config.addr, db = config.db, "Redis cache ready");
        Ok(cache)
    }

    /// Run one command under `limit`, inside a `redis` span.
    async fn bounded<T, F>(
        limit: Duration,
        command: &'static str,
        key: Option<&str>,
        fut: F,
    ) -> StorageResult<T>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        let span = tracing::debug_span!("redis", command, key = tracing::field::Empty);
        if let Some(key) = key {
            span.record("key", key);
        }
        match tokio::time::timeout(limit, fut).instrument(span).await {
            Ok(result) => result.map_err(cache_error),
            Err(_) => Err(StorageError::Timeout {
                backend: Backend::Cache,
                operation: command,
            }),
        }
    }
}

fn cache_error(err: RedisError) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout {
            backend: Backend::Cache,
            operation: "io",
        }
    } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        StorageError::Connection {
            backend: Backend::Cache,
            reason: err.to_string(),
        }
    } else {
        StorageError::Query {
            backend: Backend::Cache,
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl CounterCache for RedisCache {
    async fn get(&self, key: &str) -> StorageResult<Option<i64>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = Self::bounded(
            self.read_timeout,
            "GET",
            Some(key),
            conn.get::<_, Option<String>>(key),
        )
        .await?;
        raw.map(|value| {
            value.parse::<i64>().map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: format!("{:?} is not a decimal integer: {}", value, e),
            })
        })
        .transpose()
    }

    async fn incr(&self, key: &str) -> StorageResult<i64> {
        let mut conn = self.manager.clone();
        Self::bounded(
            self.write_timeout,
            "INCR",
            Some(key),
            conn.incr::<_, _, i64>(key, 1),
        )
        .await
    }

    async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.manager.clone();
        let cmd = ::redis::cmd("PING");
        Self::bounded(self.read_timeout, "PING", None, conn.req_packed_command(&cmd)).await?;
        Ok(())
    }
}
