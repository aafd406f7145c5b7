//! In-memory counter cache.
//!
//! Values are kept as strings, the way Redis stores them, so a corrupt entry
//! behaves the same here as it would against a real server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use duplex_core::{Backend, StorageError};

use super::CounterCache;
use crate::store::StorageResult;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value, bypassing integer parsing.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map; every write is a single insert.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CounterCache for MemoryCache {
    async fn get(&self, key: &str) -> StorageResult<Option<i64>> {
        let entries = self.lock();
        entries
            .get(key)
            .map(|raw| {
                raw.parse::<i64>().map_err(|e| StorageError::Corrupt {
                    key: key.to_string(),
                    reason: format!("{:?} is not a decimal integer: {}", raw, e),
                })
            })
            .transpose()
    }

    async fn incr(&self, key: &str) -> StorageResult<i64> {
        let mut entries = self.lock();
        let current = match entries.get(key) {
            None => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| StorageError::Query {
                backend: Backend::Cache,
                reason: "value is not an integer or out of range".to_string(),
            })?,
        };
        let next = current.checked_add(1).ok_or_else(|| StorageError::Query {
            backend: Backend::Cache,
            reason: "increment or decrement would overflow".to_string(),
        })?;
        entries.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}
