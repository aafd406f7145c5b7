//! Health Check Endpoints
//!
//! - /health/live - Process alive check
//! - /health/ready - Store and cache connectivity check

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::HttpState;
use crate::error::{ApiError, ApiResult};

pub const LIVENESS: &str = "GET /health/live";
pub const READINESS: &str = "GET /health/ready";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/live - Process liveness check
pub async fn liveness(State(state): State<Arc<HttpState>>) -> ApiResult<impl IntoResponse> {
    let response = state
        .chain
        .run(LIVENESS, async {
            Ok(HealthResponse {
                status: HealthStatus::Healthy,
                version: env!("CARGO_PKG_VERSION").to_string(),
                latency_ms: None,
            })
        })
        .await?;
    Ok(Json(response))
}

/// GET /health/ready - 503 unless both backends answer a ping
pub async fn readiness(State(state): State<Arc<HttpState>>) -> ApiResult<impl IntoResponse> {
    let response = state
        .chain
        .run(READINESS, async {
            let start = std::time::Instant::now();
            state.data.ping().await.map_err(|e| {
                ApiError::service_unavailable(format!("Not ready: {}", ApiError::from(e).message))
            })?;
            Ok::<_, ApiError>(HealthResponse {
                status: HealthStatus::Healthy,
                version: env!("CARGO_PKG_VERSION").to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            })
        })
        .await?;
    Ok(Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() -> Result<(), serde_json::Error> {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            latency_ms: None,
        };
        let json = serde_json::to_string(&response)?;
        assert!(json.contains("\"healthy\""));
        assert!(!json.contains("latency_ms"));
        Ok(())
    }
}
