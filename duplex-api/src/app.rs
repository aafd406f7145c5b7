//! Application assembly.
//!
//! `Data::connect` (store, then cache) → repositories → services → mounts.
//! Nothing listens until [`App::start`].

use std::net::SocketAddr;
use std::sync::Arc;

use duplex_core::DuplexResult;
use duplex_storage::{ArticleRepository, Data, GreeterRepository};

use crate::config::{AppConfig, ServerConfig};
use crate::error::ApiResult;
use crate::grpc;
use crate::middleware::MiddlewareChain;
use crate::routes::{self, HttpState};
use crate::server::{Listener, Mount};
use crate::services::{BlogService, GreeterService};

pub struct App {
    data: Data,
    http: Listener,
    grpc: Listener,
}

impl App {
    /// Connect the backends and wire both mounts. Any backend failure is
    /// fatal and leaves nothing open.
    pub async fn build(config: &AppConfig) -> DuplexResult<Self> {
        let data = Data::connect(&config.data).await?;
        Ok(Self::from_data(data, &config.server))
    }

    /// Wire both mounts over already-open backends.
    pub fn from_data(data: Data, server: &ServerConfig) -> Self {
        let greeter = Arc::new(GreeterService::new(Arc::new(GreeterRepository::new(
            data.clone(),
        ))));
        let blog = Arc::new(BlogService::new(Arc::new(ArticleRepository::new(data.clone()))));

        let http_chain = Arc::new(MiddlewareChain::http().with_timeout(server.http.timeout));
        let grpc_chain = Arc::new(MiddlewareChain::grpc().with_timeout(server.grpc.timeout));

        let router = routes::create_router(HttpState::new(
            Arc::clone(&greeter),
            Arc::clone(&blog),
            data.clone(),
            http_chain,
        ));
        let services = grpc::create_routes(greeter, blog, grpc_chain);

        Self {
            data,
            http: Listener::new(server.http.clone(), Mount::Http(router)),
            grpc: Listener::new(server.grpc.clone(), Mount::Grpc(services)),
        }
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn http(&self) -> &Listener {
        &self.http
    }

    pub fn grpc(&self) -> &Listener {
        &self.grpc
    }

    /// Start HTTP, then gRPC. Returns `(http, grpc)` bound addresses.
    ///
    /// A bind failure is returned as is; a listener that already started
    /// keeps serving.
    pub async fn start(&self) -> ApiResult<(SocketAddr, SocketAddr)> {
        let http = self.http.start().await?;
        let grpc = self.grpc.start().await?;
        Ok((http, grpc))
    }

    /// Stop both listeners concurrently.
    pub async fn stop(&self) -> ApiResult<()> {
        let (http, grpc) = tokio::join!(self.http.stop(), self.grpc.stop());
        http?;
        grpc
    }
}
