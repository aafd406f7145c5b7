//! Ordered request pipeline shared by both transport mounts.
//!
//! A chain is a validated list of [`Stage`]s. [`MiddlewareChain::run`] wraps
//! a handler future in those stages, innermost first, so the first stage in
//! the list is the outermost wrapper:
//!
//! ```text
//! Recovery → StatusTranslation (gRPC only) → Tracing → Logging → deadline → handler
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tracing::Instrument;

use crate::config::TransportConfig;
use crate::error::{ApiError, ApiResult};

// ============================================================================
// TYPES
// ============================================================================

/// Which mount a chain serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Grpc,
    Http,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Grpc => write!(f, "grpc"),
            Transport::Http => write!(f, "http"),
        }
    }
}

/// One cross-cutting concern. Declaration order is the only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Converts a panic anywhere deeper into an internal error.
    Recovery,
    /// Attaches the gRPC status code to errors.
    StatusTranslation,
    /// Opens a server span around everything deeper.
    Tracing,
    /// Records the outcome and latency of every call.
    Logging,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("recovery must be the first stage")]
    MissingRecovery,

    #[error("stage {0:?} appears more than once")]
    Duplicate(Stage),

    #[error("stage {later:?} is placed before {earlier:?}")]
    OutOfOrder { earlier: Stage, later: Stage },

    #[error("status translation only applies to the grpc transport")]
    TranslationOnHttp,
}

// ============================================================================
// CHAIN
// ============================================================================

#[derive(Debug, Clone)]
pub struct MiddlewareChain {
    transport: Transport,
    stages: Vec<Stage>,
    timeout: Duration,
}

impl MiddlewareChain {
    /// Validate `stages` for `transport`.
    pub fn new(transport: Transport, stages: Vec<Stage>) -> Result<Self, ChainError> {
        if stages.first() != Some(&Stage::Recovery) {
            return Err(ChainError::MissingRecovery);
        }
        for pair in stages.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if earlier == later {
                return Err(ChainError::Duplicate(later));
            }
            if later < earlier {
                return Err(ChainError::OutOfOrder { earlier: later, later: earlier });
            }
        }
        if transport == Transport::Http && stages.contains(&Stage::StatusTranslation) {
            return Err(ChainError::TranslationOnHttp);
        }
        Ok(Self {
            transport,
            stages,
            timeout: TransportConfig::DEFAULT_TIMEOUT,
        })
    }

    /// Recovery, status translation, tracing, logging.
    pub fn grpc() -> Self {
        Self {
            transport: Transport::Grpc,
            stages: vec![
                Stage::Recovery,
                Stage::StatusTranslation,
                Stage::Tracing,
                Stage::Logging,
            ],
            timeout: TransportConfig::DEFAULT_TIMEOUT,
        }
    }

    /// Recovery, tracing, logging.
    pub fn http() -> Self {
        Self {
            transport: Transport::Http,
            stages: vec![Stage::Recovery, Stage::Tracing, Stage::Logging],
            timeout: TransportConfig::DEFAULT_TIMEOUT,
        }
    }

    /// Per-request handler deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn translates(&self) -> bool {
        self.stages.contains(&Stage::StatusTranslation)
    }

    /// Run `handler` through every stage.
    pub async fn run<'a, T, F>(&'a self, operation: &'a str, handler: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>> + Send + 'a,
        T: Send + 'a,
    {
        let faulted = Arc::new(AtomicBool::new(false));
        let timeout = self.timeout;

        let mut call: BoxFuture<'a, ApiResult<T>> = async move {
            match tokio::time::timeout(timeout, handler).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::timeout(operation)),
            }
        }
        .boxed();

        for stage in self.stages.iter().rev() {
            call = match stage {
                Stage::Logging => self.logged(operation, Arc::clone(&faulted), call).boxed(),
                Stage::Tracing => {
                    let span = tracing::info_span!(
                        "request",
                        transport = %self.transport,
                        operation = %operation,
                        otel.kind = "server",
                    );
                    call.instrument(span).boxed()
                }
                Stage::StatusTranslation => {
                    async move { call.await.map_err(ApiError::translated) }.boxed()
                }
                Stage::Recovery => self.recovered(operation, Arc::clone(&faulted), call).boxed(),
            };
        }

        call.await
    }

    async fn recovered<'a, T: Send + 'a>(
        &'a self,
        operation: &'a str,
        faulted: Arc<AtomicBool>,
        inner: BoxFuture<'a, ApiResult<T>>,
    ) -> ApiResult<T> {
        let mut guarded = Box::pin(AssertUnwindSafe(inner).catch_unwind());
        let outcome = (&mut guarded).await;
        match outcome {
            Ok(result) => result,
            Err(payload) => {
                // Mark before the inner future drops so its logging sees it.
                faulted.store(true, Ordering::SeqCst);
                drop(guarded);
                tracing::error!(
                    transport = %self.transport,
                    operation = %operation,
                    panic = %panic_message(payload.as_ref()),
                    "recovered from panic in request handler"
                );
                let err = ApiError::internal_error("Internal server error");
                Err(if self.translates() { err.translated() } else { err })
            }
        }
    }

    async fn logged<'a, T: Send + 'a>(
        &'a self,
        operation: &'a str,
        faulted: Arc<AtomicBool>,
        inner: BoxFuture<'a, ApiResult<T>>,
    ) -> ApiResult<T> {
        let mut record = CallRecord {
            chain: self,
            operation,
            faulted,
            started: Instant::now(),
            finished: false,
        };
        let result = inner.await;
        record.finished = true;
        record.completed(result.as_ref().err());
        result
    }

    /// Status as the caller will see it.
    fn status_label(&self, err: Option<&ApiError>) -> String {
        match (self.transport, err) {
            (Transport::Grpc, None) => format!("{:?}", tonic::Code::Ok),
            (Transport::Grpc, Some(err)) => {
                let code = if self.translates() {
                    err.code.rpc_code()
                } else {
                    err.rpc_status()
                };
                format!("{:?}", code)
            }
            (Transport::Http, None) => "ok".to_string(),
            (Transport::Http, Some(err)) => err.status_code().as_u16().to_string(),
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

/// Logs exactly once per call: on completion, or on drop if the call never
/// completed (panic or cancellation).
struct CallRecord<'a> {
    chain: &'a MiddlewareChain,
    operation: &'a str,
    faulted: Arc<AtomicBool>,
    started: Instant,
    finished: bool,
}

impl CallRecord<'_> {
    fn completed(&self, err: Option<&ApiError>) {
        let status = self.chain.status_label(err);
        let latency_ms = self.started.elapsed().as_millis() as u64;
        match err {
            None => tracing::info!(
                transport = %self.chain.transport,
                operation = %self.operation,
                status = %status,
                latency_ms,
                "request completed"
            ),
            Some(err) if err.status_code().is_server_error() => tracing::error!(
                transport = %self.chain.transport,
                operation = %self.operation,
                status = %status,
                code = %err.code,
                error = %err.message,
                latency_ms,
                "request failed"
            ),
            Some(err) => tracing::warn!(
                transport = %self.chain.transport,
                operation = %self.operation,
                status = %status,
                code = %err.code,
                error = %err.message,
                latency_ms,
                "request rejected"
            ),
        }
    }
}

impl Drop for CallRecord<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let latency_ms = self.started.elapsed().as_millis() as u64;
        if std::thread::panicking() || self.faulted.load(Ordering::SeqCst) {
            // Report what Recovery will send, never the panic payload.
            let recovered = ApiError::internal_error("Internal server error");
            let status = self.chain.status_label(Some(&recovered));
            tracing::error!(
                transport = %self.chain.transport,
                operation = %self.operation,
                status = %status,
                code = %recovered.code,
                latency_ms,
                "request failed"
            );
        } else {
            tracing::warn!(
                transport = %self.chain.transport,
                operation = %self.operation,
                status = "cancelled",
                latency_ms,
                "request cancelled"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
