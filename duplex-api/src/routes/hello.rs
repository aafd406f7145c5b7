//! Greeter REST API Routes

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::HttpState;
use crate::error::{ApiError, ApiResult};
use crate::types::{GreetingResponse, HelloResponse, SetGreetingRequest};

pub const SAY_HELLO: &str = "GET /hello/{name}";
pub const SET_GREETING: &str = "PUT /hello/{name}";

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /hello/{name} - Greet by name
pub async fn say_hello(
    State(state): State<Arc<HttpState>>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .chain
        .run(SAY_HELLO, async {
            state.greeter.say_hello(&name).await.map_err(ApiError::from)
        })
        .await?;
    Ok(Json(HelloResponse { message }))
}

/// PUT /hello/{name} - Store the greeting for a name
pub async fn set_greeting(
    State(state): State<Arc<HttpState>>,
    Path(name): Path<String>,
    body: Result<Json<SetGreetingRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let greeting = state
        .chain
        .run(SET_GREETING, async {
            let Json(req) = body.map_err(|e| ApiError::invalid_input(e.body_text()))?;
            let greeting = state.greeter.set_greeting(&name, &req.message).await?;
            Ok::<_, ApiError>(greeting)
        })
        .await?;
    Ok(Json(GreetingResponse::from(greeting)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/:name", get(say_hello).put(set_greeting))
        .with_state(state)
}
