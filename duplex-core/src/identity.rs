//! Identity types for duplex entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Store-assigned article identifier.
///
/// The id is stable once the article exists and is the only input to the
/// like-counter cache key, so its decimal rendering must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(i64);

impl ArticleId {
    /// Wrap a raw id without validation (store rows, tests).
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Wrap an id received from a caller. Ids are positive.
    pub fn parse(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "id".to_string(),
                reason: format!("article id must be positive, got {}", raw),
            });
        }
        Ok(Self(raw))
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().parse::<i64>().map_err(|e| ValidationError::InvalidValue {
            field: "id".to_string(),
            reason: format!("{}: {}", s, e),
        })?;
        Self::parse(raw)
    }
}

impl From<ArticleId> for i64 {
    fn from(id: ArticleId) -> Self {
        id.0
    }
}
