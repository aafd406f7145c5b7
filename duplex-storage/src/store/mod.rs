//! Persistent store adapter.
//!
//! The store is the system of record for articles and greetings. It never
//! holds like counters; those live only in the cache.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgStore, SCHEMA};

use async_trait::async_trait;
use duplex_core::{Article, ArticleId, Greeting, NewArticle, Page, StorageError};

/// Result type for adapter calls.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create/read access to the persistent store.
///
/// Implementations must be safe to share across every in-flight request.
/// Dropping a returned future must abort the underlying I/O.
#[async_trait]
pub trait Store: Send + Sync {
    async fn article_create(&self, article: &NewArticle) -> StorageResult<Article>;

    async fn article_get(&self, id: ArticleId) -> StorageResult<Option<Article>>;

    /// Articles ordered newest first.
    async fn article_list(&self, page: Page) -> StorageResult<Vec<Article>>;

    async fn greeting_get(&self, name: &str) -> StorageResult<Option<Greeting>>;

    /// Insert or replace the greeting for `name`.
    async fn greeting_put(&self, name: &str, message: &str) -> StorageResult<Greeting>;

    /// Round-trip to the backend (readiness checks).
    async fn ping(&self) -> StorageResult<()>;
}
