//! HTTP mount tests
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`, over
//! in-memory backends or failing doubles.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use duplex_api::{
    create_router, BlogService, ErrorCode, GreeterService, HttpState, MiddlewareChain,
};
use duplex_storage::{ArticleRepository, Data, GreeterRepository};
use duplex_test_utils::{
    data_with_cache, data_with_store, FailingCache, FailingStore, PanickingCache,
};
use serde_json::{json, Value};
use tower::ServiceExt;

type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn router_over(data: Data) -> Router {
    let greeter = Arc::new(GreeterService::new(Arc::new(GreeterRepository::new(data.clone()))));
    let blog = Arc::new(BlogService::new(Arc::new(ArticleRepository::new(data.clone()))));
    create_router(HttpState::new(
        greeter,
        blog,
        data,
        Arc::new(MiddlewareChain::http()),
    ))
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), Box<dyn std::error::Error + Send + Sync>> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

// ============================================================================
// GREETER
// ============================================================================

#[tokio::test]
async fn test_say_hello_defaults_then_uses_stored_greeting() -> TestResult {
    let router = router_over(Data::in_memory());

    let (status, body) = call(&router, Method::GET, "/hello/kratos", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Hello kratos" }));

    let (status, body) = call(
        &router,
        Method::PUT,
        "/hello/kratos",
        Some(json!({ "message": "Welcome back" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "kratos", "message": "Welcome back" }));

    let (_, body) = call(&router, Method::GET, "/hello/kratos", None).await?;
    assert_eq!(body["message"], "Welcome back");
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() -> TestResult {
    let router = router_over(Data::in_memory());
    let (status, body) =
        call(&router, Method::PUT, "/hello/kratos", Some(json!({ "msg": 1 }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    Ok(())
}

// ============================================================================
// BLOG
// ============================================================================

#[tokio::test]
async fn test_article_lifecycle() -> TestResult {
    let router = router_over(Data::in_memory());

    let (status, created) = call(
        &router,
        Method::POST,
        "/blog/articles",
        Some(json!({ "title": "Dual transports", "content": "one service, two mounts" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("like").is_none());
    let id = created["id"].as_i64().ok_or("missing id")?;

    let (status, article) =
        call(&router, Method::GET, &format!("/blog/articles/{}", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(article["title"], "Dual transports");
    assert_eq!(article["like"], 0);

    let like_path = format!("/blog/articles/{}/like", id);
    let (status, body) = call(&router, Method::POST, &like_path, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, like) = call(&router, Method::GET, &format!("/blog/articles/{}/like", id), None).await?;
    assert_eq!(like, json!({ "id": id, "count": 1 }));

    let (status, list) = call(&router, Method::GET, "/blog/articles?limit=10", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["articles"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_never_liked_article_reads_zero() -> TestResult {
    let router = router_over(Data::in_memory());
    let (status, body) = call(&router, Method::GET, "/blog/articles/42/like", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 42, "count": 0 }));
    Ok(())
}

#[tokio::test]
async fn test_bad_input_is_rejected() -> TestResult {
    let router = router_over(Data::in_memory());

    let (status, _) = call(&router, Method::GET, "/blog/articles/abc", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&router, Method::POST, "/blog/articles/0/like", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let blank = json!({ "title": "  " });
    let (status, body) = call(&router, Method::POST, "/blog/articles", Some(blank)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, _) = call(&router, Method::GET, "/blog/articles?limit=1000", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_missing_article_is_not_found() -> TestResult {
    let router = router_over(Data::in_memory());
    let (status, body) = call(&router, Method::GET, "/blog/articles/404", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_cache_outage_is_unavailable_not_zero() -> TestResult {
    let router = router_over(data_with_cache(Arc::new(FailingCache::unreachable())));
    let (status, body) = call(&router, Method::GET, "/blog/articles/42/like", None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.get("count").is_none());

    let router = router_over(data_with_cache(Arc::new(FailingCache::timing_out())));
    let (status, _) = call(&router, Method::POST, "/blog/articles/42/like", None).await?;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    Ok(())
}

#[tokio::test]
async fn test_handler_panic_is_internal_error() -> TestResult {
    let router = router_over(data_with_cache(Arc::new(PanickingCache::new("cache exploded"))));
    let (status, body) = call(&router, Method::POST, "/blog/articles/42/like", None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], serde_json::to_value(ErrorCode::InternalError)?);
    assert!(!body.to_string().contains("cache exploded"));

    // The router keeps serving after a recovered panic.
    let (status, _) = call(&router, Method::GET, "/health/live", None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn test_readiness_reflects_backends() -> TestResult {
    let router = router_over(Data::in_memory());
    let (status, body) = call(&router, Method::GET, "/health/ready", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let router = router_over(data_with_store(Arc::new(FailingStore::unreachable())));
    let (status, _) = call(&router, Method::GET, "/health/ready", None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = call(&router, Method::GET, "/health/live", None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
