//! duplex core - entity types, errors and repository traits
//!
//! Pure data structures and capability traits. Every other crate in the
//! workspace depends on this one; it performs no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod repo;

pub use entities::{
    validate_name, Article, Greeting, NewArticle, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use error::{Backend, ConfigError, DuplexError, DuplexResult, StorageError, ValidationError};
pub use identity::{ArticleId, Timestamp};
pub use repo::{ArticleRepo, GreeterRepo};
