//! HTTP Routes
//!
//! Axum handlers for the HTTP mount. Every handler runs its body through the
//! HTTP [`MiddlewareChain`]; extractor rejections are converted inside the
//! chain so they are traced and logged like any other failure.

pub mod blog;
pub mod health;
pub mod hello;

use std::sync::Arc;

use axum::Router;
use duplex_storage::Data;

use crate::middleware::MiddlewareChain;
use crate::services::{BlogService, GreeterService};

// ============================================================================
// SHARED STATE
// ============================================================================

/// State shared by every HTTP handler.
pub struct HttpState {
    pub greeter: Arc<GreeterService>,
    pub blog: Arc<BlogService>,
    pub data: Data,
    pub chain: Arc<MiddlewareChain>,
}

impl HttpState {
    pub fn new(
        greeter: Arc<GreeterService>,
        blog: Arc<BlogService>,
        data: Data,
        chain: Arc<MiddlewareChain>,
    ) -> Self {
        Self {
            greeter,
            blog,
            data,
            chain,
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: HttpState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .nest("/hello", hello::create_router(Arc::clone(&state)))
        .nest("/blog", blog::create_router(Arc::clone(&state)))
        .nest("/health", health::create_router(state))
}
