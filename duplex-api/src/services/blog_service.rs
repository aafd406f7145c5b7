//! Blog Service
//!
//! Articles plus their like counters. Likes are read and written through
//! the repository only; a cache failure is an error, never a zero.

use std::sync::Arc;

use duplex_core::{Article, ArticleId, ArticleRepo, DuplexError, DuplexResult, NewArticle, Page};

/// An article together with its like count at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikedArticle {
    pub article: Article,
    pub likes: i64,
}

pub struct BlogService {
    repo: Arc<dyn ArticleRepo>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn ArticleRepo>) -> Self {
        Self { repo }
    }

    pub async fn create_article(&self, article: NewArticle) -> DuplexResult<Article> {
        let article = article.validated()?;
        let created = self.repo.create_article(&article).await?;
        tracing::info!(id = %created.id, "article created");
        Ok(created)
    }

    /// Fetch an article and attach its current like count.
    pub async fn get_article(&self, id: ArticleId) -> DuplexResult<LikedArticle> {
        let article = self
            .repo
            .get_article(id)
            .await?
            .ok_or_else(|| DuplexError::not_found("article", id))?;
        let likes = self.repo.get_like(id).await?;
        Ok(LikedArticle { article, likes })
    }

    pub async fn list_articles(&self, page: Page) -> DuplexResult<Vec<Article>> {
        self.repo.list_articles(page).await
    }

    pub async fn get_like(&self, id: ArticleId) -> DuplexResult<i64> {
        self.repo.get_like(id).await
    }

    pub async fn inc_like(&self, id: ArticleId) -> DuplexResult<()> {
        self.repo.inc_like(id).await
    }
}
