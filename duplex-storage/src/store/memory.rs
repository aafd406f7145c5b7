//! In-memory store for tests and local runs.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use duplex_core::{Article, ArticleId, Greeting, NewArticle, Page};
use tokio::sync::RwLock;

use super::{StorageResult, Store};

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    articles: BTreeMap<i64, Article>,
    greetings: HashMap<String, Greeting>,
}

/// Process-local store with the same contract as [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn article_create(&self, article: &NewArticle) -> StorageResult<Article> {
        let mut tables = self.tables.write().await;
        tables.last_id += 1;
        let id = tables.last_id;
        let now = Utc::now();
        let created = Article {
            id: ArticleId::new(id),
            title: article.title.clone(),
            content: article.content.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.articles.insert(id, created.clone());
        Ok(created)
    }

    async fn article_get(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        Ok(self.tables.read().await.articles.get(&id.get()).cloned())
    }

    async fn article_list(&self, page: Page) -> StorageResult<Vec<Article>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .values()
            .rev()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn greeting_get(&self, name: &str) -> StorageResult<Option<Greeting>> {
        Ok(self.tables.read().await.greetings.get(name).cloned())
    }

    async fn greeting_put(&self, name: &str, message: &str) -> StorageResult<Greeting> {
        let greeting = Greeting {
            name: name.to_string(),
            message: message.to_string(),
            updated_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .greetings
            .insert(name.to_string(), greeting.clone());
        Ok(greeting)
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}
