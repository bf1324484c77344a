use crate::{
    config::ServerConfig,
    error::{AppError, BoxError, Result},
    lifecycle::{Component, ReadySignal, ShutdownContext},
};
use async_trait::async_trait;
use axum::{routing::get, Router};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers::{health_handler, ping_handler};

const COMPONENT_NAME: &str = "http_server";

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) started_at: Instant,
}

/// HTTP listener run as a managed component.
///
/// Readiness is signalled once the socket is bound; `start` then serves
/// until `shutdown` is called.
pub struct HttpServer {
    pub(crate) config: ServerConfig,
    pub(crate) start_timeout: Duration,
    shutdown_token: CancellationToken,
    serving: watch::Sender<bool>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        let start_timeout = config.start_timeout();
        Self::with_start_timeout(config, start_timeout)
    }

    fn with_start_timeout(config: ServerConfig, start_timeout: Duration) -> Self {
        let (serving, _) = watch::channel(false);

        Self {
            config,
            start_timeout,
            shutdown_token: CancellationToken::new(),
            serving,
            local_addr: Mutex::new(None),
        }
    }

    pub fn builder() -> HttpServerBuilder {
        HttpServerBuilder::new()
    }

    /// Address the listener is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    fn router() -> Router {
        let state = ServerState {
            started_at: Instant::now(),
        };

        Router::new()
            .route("/ping", get(ping_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Component for HttpServer {
    fn name(&self) -> &str {
        COMPONENT_NAME
    }

    async fn start(&self, ready: ReadySignal) -> std::result::Result<(), BoxError> {
        let addr = format!("{}:{}", self.config.ip, self.config.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            AppError::component(
                COMPONENT_NAME.to_string(),
                format!("failed to bind {}: {}", addr, e),
            )
        })?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock() = Some(local_addr);
        self.serving.send_replace(true);

        info!(address = %local_addr, "HTTP server listening");
        ready.signal();

        let token = self.shutdown_token.clone();
        let served = axum::serve(listener, Self::router())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await;
        self.serving.send_replace(false);

        served.map_err(|e| {
            AppError::component(COMPONENT_NAME.to_string(), format!("server error: {}", e))
        })?;

        info!(address = %local_addr, "HTTP server stopped");
        Ok(())
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> std::result::Result<(), BoxError> {
        info!("Stopping HTTP server");
        self.shutdown_token.cancel();

        let mut serving = self.serving.subscribe();
        let drained = async { serving.wait_for(|serving| !*serving).await.map(|_| ()) };

        tokio::select! {
            result = drained => {
                result?;
                Ok(())
            }
            _ = ctx.cancelled() => {
                warn!("HTTP server did not drain connections before the deadline");
                Err(AppError::component(
                    COMPONENT_NAME,
                    "graceful shutdown deadline exceeded",
                )
                .into())
            }
        }
    }

    fn start_timeout(&self) -> Duration {
        self.start_timeout
    }
}

/// HTTP server builder for configuration
pub struct HttpServerBuilder {
    config: Option<ServerConfig>,
    start_timeout: Option<Duration>,
}

impl HttpServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            start_timeout: None,
        }
    }

    /// Set the listener configuration
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the start timeout from the configuration
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpServer> {
        let config = self.config.ok_or_else(|| {
            AppError::component(COMPONENT_NAME, "server configuration is required")
        })?;
        let start_timeout = self
            .start_timeout
            .unwrap_or_else(|| config.start_timeout());

        Ok(HttpServer::with_start_timeout(config, start_timeout))
    }
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
