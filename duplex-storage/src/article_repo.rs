//! Article repository: store-backed articles plus a cache-aside like counter.

use async_trait::async_trait;
use duplex_core::{Article, ArticleId, ArticleRepo, DuplexResult, NewArticle, Page};

use crate::data::Data;

/// Cache key holding the like counter for an article.
pub fn like_key(id: ArticleId) -> String {
    format!("like:{}", id)
}

pub struct ArticleRepository {
    data: Data,
}

impl ArticleRepository {
    pub fn new(data: Data) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ArticleRepo for ArticleRepository {
    async fn create_article(&self, article: &NewArticle) -> DuplexResult<Article> {
        let created = self.data.store().article_create(article).await?;
        tracing::debug!(id = %created.id, "article created");
        Ok(created)
    }

    async fn get_article(&self, id: ArticleId) -> DuplexResult<Option<Article>> {
        Ok(self.data.store().article_get(id).await?)
    }

    async fn list_articles(&self, page: Page) -> DuplexResult<Vec<Article>> {
        Ok(self.data.store().article_list(page).await?)
    }

    /// Counters are never seeded, so a missing key is an article nobody has
    /// liked yet. This is the only place that conversion happens.
    async fn get_like(&self, id: ArticleId) -> DuplexResult<i64> {
        let count = self.data.cache().get(&like_key(id)).await?;
        Ok(count.unwrap_or(0))
    }

    async fn inc_like(&self, id: ArticleId) -> DuplexResult<()> {
        let count = self.data.cache().incr(&like_key(id)).await?;
        tracing::debug!(id = %id, likes = count, "like recorded");
        Ok(())
    }
}
