//! HTTP Request and Response Types
//!
//! JSON bodies for the HTTP mount. Field names mirror the gRPC messages so a
//! client can switch transports without remapping.

use serde::{Deserialize, Serialize};

use duplex_core::{Article, ArticleId, Greeting, NewArticle, Timestamp};

use crate::services::LikedArticle;

// ============================================================================
// GREETER TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
}

/// Body of `PUT /hello/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetGreetingRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingResponse {
    pub name: String,
    pub message: String,
}

impl From<Greeting> for GreetingResponse {
    fn from(greeting: Greeting) -> Self {
        Self {
            name: greeting.name,
            message: greeting.message,
        }
    }
}

// ============================================================================
// BLOG TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl From<CreateArticleRequest> for NewArticle {
    fn from(req: CreateArticleRequest) -> Self {
        NewArticle::new(req.title, req.content)
    }
}

/// An article as sent over HTTP. `like` is present only on single-article
/// reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<i64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            content: article.content,
            like: None,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

impl From<LikedArticle> for ArticleResponse {
    fn from(liked: LikedArticle) -> Self {
        Self {
            like: Some(liked.likes),
            ..liked.article.into()
        }
    }
}

/// Query string of `GET /blog/articles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListArticlesRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListArticlesResponse {
    pub articles: Vec<ArticleResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: ArticleId,
    pub count: i64,
}

/// `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article() -> Article {
        let now = Utc::now();
        Article {
            id: ArticleId::new(42),
            title: "Dual transports".to_string(),
            content: "body".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_like_omitted_from_plain_article() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ArticleResponse::from(article()))?;
        assert_eq!(json["id"], 42);
        assert!(json.get("like").is_none());
        Ok(())
    }

    #[test]
    fn test_like_present_on_liked_article() -> Result<(), serde_json::Error> {
        let liked = LikedArticle {
            article: article(),
            likes: 0,
        };
        let json = serde_json::to_value(ArticleResponse::from(liked))?;
        assert_eq!(json["like"], 0);
        Ok(())
    }

    #[test]
    fn test_empty_response_is_empty_object() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&EmptyResponse {})?, "{}");
        Ok(())
    }
}
