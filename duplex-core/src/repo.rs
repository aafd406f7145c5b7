//! Repository capability traits consumed by the service layer.
//!
//! These are the only seams between business logic and storage. Neither
//! trait mentions a wire protocol, a store driver, or a cache key.

use async_trait::async_trait;

use crate::entities::{Article, Greeting, NewArticle, Page};
use crate::error::DuplexResult;
use crate::identity::ArticleId;

/// Article persistence plus the cache-aside like counter.
#[async_trait]
pub trait ArticleRepo: Send + Sync {
    /// Persist a new article and return it with its assigned id.
    async fn create_article(&self, article: &NewArticle) -> DuplexResult<Article>;

    /// Fetch an article by id.
    async fn get_article(&self, id: ArticleId) -> DuplexResult<Option<Article>>;

    /// List articles, newest first.
    async fn list_articles(&self, page: Page) -> DuplexResult<Vec<Article>>;

    /// Current like count. An article that was never liked has zero likes.
    async fn get_like(&self, id: ArticleId) -> DuplexResult<i64>;

    /// Atomically add one like. Not idempotent: every call counts.
    async fn inc_like(&self, id: ArticleId) -> DuplexResult<()>;
}

/// Store-backed greeting lookup.
#[async_trait]
pub trait GreeterRepo: Send + Sync {
    async fn find_greeting(&self, name: &str) -> DuplexResult<Option<Greeting>>;

    /// Insert or replace the greeting for `name`.
    async fn save_greeting(&self, name: &str, message: &str) -> DuplexResult<Greeting>;
}
