//! duplex Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Backend doubles that fail, stall, or panic on demand
//! - Proptest generators for entity types
//! - Fixtures for common scenarios
//! - Assertions over `DuplexResult`

pub use duplex_core::{
    Article, ArticleId, Backend, DuplexError, DuplexResult, Greeting, NewArticle, Page,
    StorageError, Timestamp, ValidationError,
};
pub use duplex_storage::{
    CounterCache, Data, MemoryCache, MemoryStore, StorageResult, Store,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// BACKEND DOUBLES
// ============================================================================

/// Cache that fails every call with the same error.
#[derive(Debug, Clone)]
pub struct FailingCache {
    error: StorageError,
}

impl FailingCache {
    pub fn new(error: StorageError) -> Self {
        Self { error }
    }

    /// A cache whose server refuses connections.
    pub fn unreachable() -> Self {
        Self::new(StorageError::Connection {
            backend: Backend::Cache,
            reason: "connection refused".to_string(),
        })
    }

    /// A cache whose reads and writes time out.
    pub fn timing_out() -> Self {
        Self::new(StorageError::Timeout {
            backend: Backend::Cache,
            operation: "GET",
        })
    }
}

#[async_trait]
impl CounterCache for FailingCache {
    async fn get(&self, _key: &str) -> StorageResult<Option<i64>> {
        Err(self.error.clone())
    }

    async fn incr(&self, _key: &str) -> StorageResult<i64> {
        Err(self.error.clone())
    }

    async fn ping(&self) -> StorageResult<()> {
        Err(self.error.clone())
    }
}

/// Store that fails every call with the same error.
#[derive(Debug, Clone)]
pub struct FailingStore {
    error: StorageError,
}

impl FailingStore {
    pub fn new(error: StorageError) -> Self {
        Self { error }
    }

    pub fn unreachable() -> Self {
        Self::new(StorageError::Connection {
            backend: Backend::Store,
            reason: "connection refused".to_string(),
        })
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn article_create(&self, _article: &NewArticle) -> StorageResult<Article> {
        Err(self.error.clone())
    }

    async fn article_get(&self, _id: ArticleId) -> StorageResult<Option<Article>> {
        Err(self.error.clone())
    }

    async fn article_list(&self, _page: Page) -> StorageResult<Vec<Article>> {
        Err(self.error.clone())
    }

    async fn greeting_get(&self, _name: &str) -> StorageResult<Option<Greeting>> {
        Err(self.error.clone())
    }

    async fn greeting_put(&self, _name: &str, _message: &str) -> StorageResult<Greeting> {
        Err(self.error.clone())
    }

    async fn ping(&self) -> StorageResult<()> {
        Err(self.error.clone())
    }
}

/// Cache that panics on every counter call.
#[derive(Debug, Clone)]
pub struct PanickingCache {
    message: &'static str,
}

impl PanickingCache {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[async_trait]
impl CounterCache for PanickingCache {
    async fn get(&self, _key: &str) -> StorageResult<Option<i64>> {
        panic!("{}", self.message)
    }

    async fn incr(&self, _key: &str) -> StorageResult<i64> {
        panic!("{}", self.message)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Memory cache whose counter calls park at a gate until released.
///
/// Lets a test hold a request in flight while it does something else, such
/// as stopping a listener.
#[derive(Debug)]
pub struct GatedCache {
    inner: MemoryCache,
    gate: Semaphore,
    entered: Notify,
    waiting: AtomicUsize,
}

impl Default for GatedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GatedCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(),
            gate: Semaphore::new(0),
            entered: Notify::new(),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Resolve once some call has reached the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await
    }

    /// Let `n` parked or future calls through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Calls currently parked at the gate.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryCache {
        &self.inner
    }

    async fn pass(&self) -> StorageResult<()> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let permit = self.gate.acquire().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        match permit {
            Ok(permit) => {
                permit.forget();
                Ok(())
            }
            Err(_) => Err(StorageError::Connection {
                backend: Backend::Cache,
                reason: "gate closed".to_string(),
            }),
        }
    }
}

#[async_trait]
impl CounterCache for GatedCache {
    async fn get(&self, key: &str) -> StorageResult<Option<i64>> {
        self.pass().await?;
        self.inner.get(key).await
    }

    async fn incr(&self, key: &str) -> StorageResult<i64> {
        self.pass().await?;
        self.inner.incr(key).await
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Data container over an in-memory store and the given cache.
pub fn data_with_cache(cache: Arc<dyn CounterCache>) -> Data {
    Data::new(Arc::new(MemoryStore::new()), cache)
}

/// Data container over the given store and an in-memory cache.
pub fn data_with_store(store: Arc<dyn Store>) -> Data {
    Data::new(store, Arc::new(MemoryCache::new()))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for duplex entity types.

    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    /// Generate a valid (positive) ArticleId.
    pub fn arb_article_id() -> impl Strategy<Value = ArticleId> {
        (1i64..=i64::MAX).prop_map(ArticleId::new)
    }

    /// Generate a raw id that `ArticleId::parse` rejects.
    pub fn arb_invalid_article_id() -> impl Strategy<Value = i64> {
        i64::MIN..=0i64
    }

    /// Generate a greeting name that survives path segments unescaped.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_-]{0,23}"
    }

    /// Generate an article title with no leading or trailing whitespace.
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.!?]{0,62}[A-Za-z0-9]"
    }

    pub fn arb_content() -> impl Strategy<Value = String> {
        ".{0,256}"
    }

    pub fn arb_new_article() -> impl Strategy<Value = NewArticle> {
        (arb_title(), arb_content()).prop_map(|(title, content)| NewArticle::new(title, content))
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_page() -> impl Strategy<Value = Page> {
        (1i64..=duplex_core::MAX_PAGE_SIZE, 0i64..1000)
            .prop_map(|(limit, offset)| Page { limit, offset })
    }

    pub fn arb_backend() -> impl Strategy<Value = Backend> {
        prop_oneof![Just(Backend::Store), Just(Backend::Cache)]
    }

    /// Generate any backend failure.
    pub fn arb_storage_error() -> impl Strategy<Value = StorageError> {
        prop_oneof![
            (arb_backend(), "[a-z ]{1,32}")
                .prop_map(|(backend, reason)| StorageError::Connection { backend, reason }),
            (arb_backend(), prop_oneof![Just("GET"), Just("INCR"), Just("query")])
                .prop_map(|(backend, operation)| StorageError::Timeout { backend, operation }),
            (arb_backend(), "[a-z ]{1,32}")
                .prop_map(|(backend, reason)| StorageError::Query { backend, reason }),
            ("like:[0-9]{1,6}", "[a-z ]{1,32}")
                .prop_map(|(key, reason)| StorageError::Corrupt { key, reason }),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;
    use chrono::Utc;

    /// An article as it would come back from the store.
    pub fn article(id: i64) -> Article {
        let now = Utc::now();
        Article {
            id: ArticleId::new(id),
            title: format!("Article {}", id),
            content: "Body text".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_article() -> NewArticle {
        NewArticle::new("Getting started", "A first post")
    }

    /// In-memory data with `count` articles already stored.
    pub async fn seeded_data(count: usize) -> StorageResult<Data> {
        let data = Data::in_memory();
        for i in 0..count {
            data.store()
                .article_create(&NewArticle::new(format!("Post {}", i + 1), "seeded"))
                .await?;
        }
        Ok(data)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over `DuplexResult` variants.

    use super::*;

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &DuplexResult<T>, entity: &str) {
        match result {
            Err(DuplexError::NotFound { entity: e, .. }) => {
                assert_eq!(*e, entity, "Wrong entity in NotFound error");
            }
            other => panic!("Expected NotFound error for {}, got: {:?}", entity, other),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &DuplexResult<T>) {
        match result {
            Err(DuplexError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert a storage error raised by the given backend.
    #[track_caller]
    pub fn assert_backend_error<T: std::fmt::Debug>(result: &DuplexResult<T>, backend: Backend) {
        match result {
            Err(DuplexError::Storage(
                StorageError::Connection { backend: b, .. }
                | StorageError::Timeout { backend: b, .. }
                | StorageError::Query { backend: b, .. },
            )) => assert_eq!(*b, backend, "Wrong backend in storage error"),
            other => panic!("Expected {} storage error, got: {:?}", backend, other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failing_cache_repeats_error() {
        let cache = FailingCache::unreachable();
        assert!(matches!(cache.get("k").await, Err(StorageError::Connection { .. })));
        assert!(matches!(cache.incr("k").await, Err(StorageError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_gated_cache_parks_until_released() -> StorageResult<()> {
        let cache = Arc::new(GatedCache::new());
        let task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.incr("like:1").await })
        };
        cache.wait_entered().await;
        assert_eq!(cache.waiting(), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        cache.release(1);
        let value = task.await.expect("task panicked")?;
        assert_eq!(value, 1);
        assert_eq!(cache.inner().get("like:1").await?, Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_seeded_data() -> StorageResult<()> {
        let data = fixtures::seeded_data(3).await?;
        let listed = data.store().article_list(Page::default()).await?;
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].title, "Post 3");
        Ok(())
    }
}
