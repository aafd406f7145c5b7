//! duplex server entry point
//!
//! Reads configuration from the environment, connects the store and cache,
//! then serves HTTP and gRPC until Ctrl-C.

use duplex_api::{init_tracing, ApiError, ApiResult, App, AppConfig, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&TelemetryConfig {
        format: config.log_format,
        ..TelemetryConfig::default()
    })?;

    let app = App::build(&config).await.map_err(|e| {
        tracing::error!(error = %e, "startup failed");
        ApiError::from(e)
    })?;

    if let Err(e) = app.start().await {
        tracing::error!(error = %e, "failed to start listeners");
        app.stop().await?;
        return Err(e);
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to wait for Ctrl-C: {}", e)))?;
    tracing::info!("Shutdown signal received");

    app.stop().await
}
