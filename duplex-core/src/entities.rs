//! Entity types for articles and greetings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{ArticleId, Timestamp};

/// Default page size for article listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on a single article listing page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A persisted blog article.
///
/// The like counter is not part of the entity; it lives in the cache and is
/// attached by the service layer when a response needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Trim the title and reject empty ones.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "title".to_string(),
            });
        }
        Ok(Self {
            title,
            content: self.content,
        })
    }
}

/// A stored greeting, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub name: String,
    pub message: String,
    pub updated_at: Timestamp,
}

/// Normalize a greeting name (the greeting's identity).
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Pagination window for article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Build a page from optional caller input, applying defaults.
    pub fn from_parts(limit: Option<i64>, offset: Option<i64>) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ValidationError::InvalidValue {
                field: "limit".to_string(),
                reason: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, limit),
            });
        }
        if offset < 0 {
            return Err(ValidationError::InvalidValue {
                field: "offset".to_string(),
                reason: format!("must not be negative, got {}", offset),
            });
        }
        Ok(Self { limit, offset })
    }
}
