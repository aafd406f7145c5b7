//! duplex storage - store and cache adapters, repositories
//!
//! The store (PostgreSQL) is the system of record for articles and
//! greetings. Like counters live only in the cache (Redis) and are read
//! cache-aside: a counter that was never incremented reads as zero.

pub mod article_repo;
pub mod cache;
pub mod config;
pub mod data;
pub mod greeter_repo;
pub mod store;

#[cfg(test)]
mod test_log;

pub use article_repo::{like_key, ArticleRepository};
pub use cache::{CounterCache, MemoryCache, RedisCache};
pub use config::{CacheConfig, CacheDriver, DataConfig, StoreConfig, StoreDriver};
pub use data::Data;
pub use greeter_repo::GreeterRepository;
pub use store::{MemoryStore, PgStore, StorageResult, Store, SCHEMA};
