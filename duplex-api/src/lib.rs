//! duplex API - gRPC and HTTP mounts over one service layer
//!
//! Greeter and blog services exposed through `tonic` and `axum` at the same
//! time. Both mounts share the service layer in [`services`], run each
//! request through a [`middleware::MiddlewareChain`], and are served by
//! independent [`server::Listener`]s.

pub mod app;
pub mod config;
pub mod error;
pub mod grpc;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use app::App;
pub use config::{AppConfig, LogFormat, Network, ServerConfig, TransportConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use grpc::{create_routes, proto};
pub use middleware::{ChainError, MiddlewareChain, Stage, Transport};
pub use routes::{create_router, HttpState};
pub use server::{Listener, ListenerState, Mount};
pub use services::{BlogService, GreeterService, LikedArticle};
pub use telemetry::{init_tracing, TelemetryConfig};
