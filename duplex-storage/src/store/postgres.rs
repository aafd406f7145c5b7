//! PostgreSQL store using deadpool-postgres.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime,
};
use duplex_core::{Article, ArticleId, Backend, Greeting, NewArticle, Page, StorageError};
use tokio_postgres::{NoTls, Row};
use tracing::Instrument;

use super::{StorageResult, Store};
use crate::config::{StoreConfig, StoreDriver};

/// Idempotent schema-ensure, run on every construction.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id          BIGSERIAL PRIMARY KEY,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS greetings (
    name        TEXT PRIMARY KEY,
    message     TEXT NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

const ARTICLE_COLUMNS: &str = "id, title, content, created_at, updated_at";

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    timeout: Duration,
}

impl PgStore {
    /// Open the pool, then ensure the schema exists.
    ///
    /// Any failure here is fatal: the caller gets no store at all.
    pub async fn connect(config: &StoreConfig) -> StorageResult<Self> {
        if config.driver != StoreDriver::Postgres {
            return Err(StorageError::Connection {
                backend: Backend::Store,
                reason: format!("driver {:?} is not served by PgStore", config.driver),
            });
        }

        let pool = create_pool(config)?;
        let store = Self {
            pool,
            timeout: config.timeout,
        };
        store.ensure_schema().await?;
        tracing::info!(pool_size = config.max_size, "PostgreSQL store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> StorageResult<()> {
        self.bounded("ensure_schema", async {
            let conn = self.pool.get().await.map_err(pool_error)?;
            conn.batch_execute(SCHEMA)
                .await
                .map_err(|e| StorageError::Schema {
                    reason: e.to_string(),
                })
        })
        .await
    }

    async fn get_conn(&self) -> StorageResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }

    /// Bound a store call by the configured timeout, inside a `postgres`
    /// span. Dropping the inner future on expiry abandons the in-flight query.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .instrument(tracing::debug_span!("postgres", operation))
            .await
            .map_err(|_| StorageError::Timeout {
                backend: Backend::Store,
                operation,
            })?
    }
}

fn create_pool(config: &StoreConfig) -> StorageResult<Pool> {
    let mut cfg = Config::new();
    cfg.url = Some(config.source.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let mut pool_config = PoolConfig::new(config.max_size);
    pool_config.timeouts.wait = Some(config.timeout);
    pool_config.timeouts.create = Some(config.timeout);
    cfg.pool = Some(pool_config);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| StorageError::Connection {
            backend: Backend::Store,
            reason: format!("failed to create pool: {}", e),
        })
}

fn pool_error(err: PoolError) -> StorageError {
    tracing::error!("Connection pool error: {:?}", err);
    match err {
        PoolError::Timeout(_) => StorageError::Timeout {
            backend: Backend::Store,
            operation: "acquire",
        },
        other => StorageError::Connection {
            backend: Backend::Store,
            reason: other.to_string(),
        },
    }
}

fn query_error(err: tokio_postgres::Error) -> StorageError {
    tracing::error!("Database error: {:?}", err);
    if err.is_closed() {
        StorageError::Connection {
            backend: Backend::Store,
            reason: err.to_string(),
        }
    } else {
        StorageError::Query {
            backend: Backend::Store,
            reason: err.to_string(),
        }
    }
}

fn article_from_row(row: &Row) -> StorageResult<Article> {
    Ok(Article {
        id: ArticleId::new(row.try_get("id").map_err(query_error)?),
        title: row.try_get("title").map_err(query_error)?,
        content: row.try_get("content").map_err(query_error)?,
        created_at: row.try_get("created_at").map_err(query_error)?,
        updated_at: row.try_get("updated_at").map_err(query_error)?,
    })
}

fn greeting_from_row(row: &Row) -> StorageResult<Greeting> {
    Ok(Greeting {
        name: row.try_get("name").map_err(query_error)?,
        message: row.try_get("message").map_err(query_error)?,
        updated_at: row.try_get("updated_at").map_err(query_error)?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn article_create(&self, article: &NewArticle) -> StorageResult<Article> {
        self.bounded("article_create", async {
            let conn = self.get_conn().await?;
            let sql = format!(
                "INSERT INTO articles (title, content) VALUES ($1, $2) RETURNING {}",
                ARTICLE_COLUMNS
            );
            let row = conn
                .query_one(sql.as_str(), &[&article.title, &article.content])
                .await
                .map_err(query_error)?;
            article_from_row(&row)
        })
        .await
    }

    async fn article_get(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        self.bounded("article_get", async {
            let conn = self.get_conn().await?;
            let sql = format!("SELECT {} FROM articles WHERE id = $1", ARTICLE_COLUMNS);
            let row = conn
                .query_opt(sql.as_str(), &[&id.get()])
                .await
                .map_err(query_error)?;
            row.as_ref().map(article_from_row).transpose()
        })
        .await
    }

    async fn article_list(&self, page: Page) -> StorageResult<Vec<Article>> {
        self.bounded("article_list", async {
            let conn = self.get_conn().await?;
            let sql = format!(
                "SELECT {} FROM articles ORDER BY id DESC LIMIT $1 OFFSET $2",
                ARTICLE_COLUMNS
            );
            let rows = conn
                .query(sql.as_str(), &[&page.limit, &page.offset])
                .await
                .map_err(query_error)?;
            rows.iter().map(article_from_row).collect()
        })
        .await
    }

    async fn greeting_get(&self, name: &str) -> StorageResult<Option<Greeting>> {
        self.bounded("greeting_get", async {
            let conn = self.get_conn().await?;
            let row = conn
                .query_opt(
                    "SELECT name, message, updated_at FROM greetings WHERE name = $1",
                    &[&name],
                )
                .await
                .map_err(query_error)?;
            row.as_ref().map(greeting_from_row).transpose()
        })
        .await
    }

    async fn greeting_put(&self, name: &str, message: &str) -> StorageResult<Greeting> {
        self.bounded("greeting_put", async {
            let conn = self.get_conn().await?;
            let row = conn
                .query_one(
                    "INSERT INTO greetings (name, message) VALUES ($1, $2) \
                     ON CONFLICT (name) DO UPDATE \
                     SET message = EXCLUDED.message, updated_at = now() \
                     RETURNING name, message, updated_at",
                    &[&name, &message],
                )
                .await
                .map_err(query_error)?;
            greeting_from_row(&row)
        })
        .await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.bounded("ping", async {
            let conn = self.get_conn().await?;
            conn.simple_query("SELECT 1").await.map_err(query_error)?;
            Ok(())
        })
        .await
    }
}
