//! Transport listeners.
//!
//! A [`Listener`] owns one mount (an axum router or a set of tonic services)
//! and the socket it is served on. Each listener has its own shutdown signal,
//! so stopping one never disturbs the other.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;

use crate::config::TransportConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Transport;

// ============================================================================
// STATE
// ============================================================================

/// Lifecycle of a listener.
///
/// `Unstarted → Listening → Draining → Stopped`, or `Failed` when binding
/// fails. A failed or stopped listener holds no socket and may be started
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unstarted,
    Listening(SocketAddr),
    /// No new connections; in-flight requests are finishing.
    Draining(SocketAddr),
    Stopped,
    Failed,
}

impl ListenerState {
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            ListenerState::Listening(addr) | ListenerState::Draining(addr) => Some(*addr),
            _ => None,
        }
    }
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerState::Unstarted => write!(f, "unstarted"),
            ListenerState::Listening(addr) => write!(f, "listening on {}", addr),
            ListenerState::Draining(addr) => write!(f, "draining {}", addr),
            ListenerState::Stopped => write!(f, "stopped"),
            ListenerState::Failed => write!(f, "failed"),
        }
    }
}

/// What a listener serves.
#[derive(Clone)]
pub enum Mount {
    Http(axum::Router),
    Grpc(tonic::service::Routes),
}

impl Mount {
    fn transport(&self) -> Transport {
        match self {
            Mount::Http(_) => Transport::Http,
            Mount::Grpc(_) => Transport::Grpc,
        }
    }
}

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), String>>,
}

// ============================================================================
// LISTENER
// ============================================================================

pub struct Listener {
    config: TransportConfig,
    mount: Mount,
    state: Arc<watch::Sender<ListenerState>>,
    running: Mutex<Option<Running>>,
}

impl Listener {
    pub fn new(config: TransportConfig, mount: Mount) -> Self {
        let (state, _) = watch::channel(ListenerState::Unstarted);
        Self {
            config,
            mount,
            state: Arc::new(state),
            running: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> Transport {
        self.mount.transport()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Bound address while listening or draining.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state().local_addr()
    }

    /// Bind the configured address and start serving.
    ///
    /// Returns the bound address (useful with port 0). On failure the
    /// listener is `Failed` and holds nothing.
    pub async fn start(&self) -> ApiResult<SocketAddr> {
        let mut running = self.running.lock().await;
        if let Some(addr) = self.state().local_addr() {
            return Err(ApiError::state_conflict(format!(
                "{} listener is already serving on {}",
                self.transport(),
                addr
            )));
        }

        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(
                    transport = %self.transport(),
                    addr = %self.config.addr,
                    error = %e,
                    "listener failed to start"
                );
                self.state.send_replace(ListenerState::Failed);
                return Err(e);
            }
        };
        let addr = listener.local_addr().map_err(|e| {
            self.state.send_replace(ListenerState::Failed);
            ApiError::internal_error(format!("Failed to read bound address: {}", e))
        })?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = self.spawn(listener, signal);
        *running = Some(Running { shutdown, task });
        self.state.send_replace(ListenerState::Listening(addr));

        tracing::info!(transport = %self.transport(), %addr, "listener started");
        Ok(addr)
    }

    /// Stop accepting, wait for in-flight requests, release the socket.
    ///
    /// Stopping a listener that is not serving is a no-op.
    pub async fn stop(&self) -> ApiResult<()> {
        let mut running = self.running.lock().await;
        let Some(Running { shutdown, task }) = running.take() else {
            return Ok(());
        };
        // A serve loop that already died has left the listener Failed.
        let serving = self.state().local_addr();
        if let Some(addr) = serving {
            self.state.send_replace(ListenerState::Draining(addr));
            tracing::info!(transport = %self.transport(), %addr, "listener draining");
        }

        // The serve task may already have exited and dropped the receiver.
        let _ = shutdown.send(());
        let outcome = task.await;
        if serving.is_some() {
            self.state.send_replace(ListenerState::Stopped);
        }

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(transport = %self.transport(), "listener stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ApiError::internal_error(format!(
                "{} server error: {}",
                self.transport(),
                e
            ))),
            Err(e) => Err(ApiError::internal_error(format!(
                "{} server task failed: {}",
                self.transport(),
                e
            ))),
        }
    }

    async fn bind(&self) -> ApiResult<TcpListener> {
        let network = self.config.network;
        let candidates: Vec<SocketAddr> = tokio::net::lookup_host(self.config.addr.as_str())
            .await
            .map_err(|e| {
                ApiError::invalid_input(format!("Invalid bind address {}: {}", self.config.addr, e))
            })?
            .filter(|addr| network.accepts(addr))
            .collect();

        let mut last_error = None;
        for addr in candidates {
            match TcpListener::bind(addr).await {
                Ok(listener) => return Ok(listener),
                Err(e) => last_error = Some(format!("{}: {}", addr, e)),
            }
        }
        Err(match last_error {
            Some(reason) => ApiError::service_unavailable(format!("Failed to bind {}", reason)),
            None => ApiError::invalid_input(format!(
                "{} does not resolve to a {} address",
                self.config.addr, network
            )),
        })
    }

    fn spawn(
        &self,
        listener: TcpListener,
        signal: oneshot::Receiver<()>,
    ) -> JoinHandle<Result<(), String>> {
        let shutdown = async {
            let _ = signal.await;
        };
        let state = Arc::clone(&self.state);
        let transport = self.transport();

        match self.mount.clone() {
            Mount::Http(router) => tokio::spawn(async move {
                let result = axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown)
                    .await
                    .map_err(|e| e.to_string());
                serve_exited(&state, transport, result)
            }),
            Mount::Grpc(routes) => tokio::spawn(async move {
                let result = tonic::transport::Server::builder()
                    .add_routes(routes)
                    .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
                    .await
                    .map_err(|e| e.to_string());
                serve_exited(&state, transport, result)
            }),
        }
    }
}

/// A serve loop that dies on its own leaves the listener `Failed`.
fn serve_exited(
    state: &watch::Sender<ListenerState>,
    transport: Transport,
    result: Result<(), String>,
) -> Result<(), String> {
    if let Err(e) = &result {
        tracing::error!(transport = %transport, error = %e, "serve loop exited");
        state.send_if_modified(|current| {
            if matches!(current, ListenerState::Listening(_)) {
                *current = ListenerState::Failed;
                true
            } else {
                false
            }
        });
    }
    result
}
