//! Blog REST API Routes
//!
//! Article ids arrive as raw path segments and are parsed inside the chain,
//! so a malformed id is a logged 400 rather than a bare extractor rejection.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use duplex_core::{ArticleId, Page};

use super::HttpState;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    ArticleResponse, CreateArticleRequest, EmptyResponse, LikeResponse, ListArticlesRequest,
    ListArticlesResponse,
};

pub const CREATE_ARTICLE: &str = "POST /blog/articles";
pub const LIST_ARTICLES: &str = "GET /blog/articles";
pub const GET_ARTICLE: &str = "GET /blog/articles/{id}";
pub const GET_LIKE: &str = "GET /blog/articles/{id}/like";
pub const INC_LIKE: &str = "POST /blog/articles/{id}/like";

fn parse_id(raw: &str) -> ApiResult<ArticleId> {
    Ok(raw.parse::<ArticleId>()?)
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /blog/articles - Create an article
pub async fn create_article(
    State(state): State<Arc<HttpState>>,
    body: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let article = state
        .chain
        .run(CREATE_ARTICLE, async {
            let Json(req) = body.map_err(|e| ApiError::invalid_input(e.body_text()))?;
            let article = state.blog.create_article(req.into()).await?;
            Ok::<_, ApiError>(article)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ArticleResponse::from(article))))
}

/// GET /blog/articles - List articles, newest first
pub async fn list_articles(
    State(state): State<Arc<HttpState>>,
    query: Result<Query<ListArticlesRequest>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let articles = state
        .chain
        .run(LIST_ARTICLES, async {
            let Query(params) = query.map_err(|e| ApiError::invalid_input(e.body_text()))?;
            let page = Page::from_parts(params.limit, params.offset)?;
            let articles = state.blog.list_articles(page).await?;
            Ok::<_, ApiError>(articles)
        })
        .await?;
    Ok(Json(ListArticlesResponse {
        articles: articles.into_iter().map(ArticleResponse::from).collect(),
    }))
}

/// GET /blog/articles/{id} - Fetch an article with its like count
pub async fn get_article(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let liked = state
        .chain
        .run(GET_ARTICLE, async {
            let id = parse_id(&id)?;
            let liked = state.blog.get_article(id).await?;
            Ok::<_, ApiError>(liked)
        })
        .await?;
    Ok(Json(ArticleResponse::from(liked)))
}

/// GET /blog/articles/{id}/like - Current like count
pub async fn get_like(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (id, count) = state
        .chain
        .run(GET_LIKE, async {
            let id = parse_id(&id)?;
            let count = state.blog.get_like(id).await?;
            Ok::<_, ApiError>((id, count))
        })
        .await?;
    Ok(Json(LikeResponse { id, count }))
}

/// POST /blog/articles/{id}/like - Add one like
pub async fn inc_like(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .chain
        .run(INC_LIKE, async {
            let id = parse_id(&id)?;
            state.blog.inc_like(id).await?;
            Ok::<_, ApiError>(())
        })
        .await?;
    Ok(Json(EmptyResponse {}))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route("/articles/:id", get(get_article))
        .route("/articles/:id/like", get(get_like).post(inc_like))
        .with_state(state)
}
