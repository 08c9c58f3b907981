//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router from the registered route groups
//! - Wire up the request pipeline
//! - Bind the listener and serve until the shutdown scope ends
//! - Close live streams and drain in-flight requests on shutdown
//!
//! # Lifecycle
//! ```text
//! constructed ──run/serve──▶ running ──scope triggered──▶ shutting down ──▶ stopped
//! ```
//! Two tasks share a child of the caller's shutdown scope: the listener
//! task serves connections, the watcher task waits for the scope and then
//! stops the listener. The listener ending on its own ends the scope too.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinError;

use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::http::response::respond_failure;
use crate::http::{docs, middleware};
use crate::lifecycle::Shutdown;
use crate::routes::RouteGroup;
use crate::streams::StreamManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    /// `None` when the server was built without a stream manager.
    pub streams: Option<Arc<StreamManager>>,
    /// Names of the registered route groups, in registration order.
    pub handlers: Arc<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
    #[error("Server task failed: {0}")]
    Task(#[from] JoinError),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    config: Arc<GatewayConfig>,
    groups: Vec<Box<dyn RouteGroup>>,
    streams: Option<Arc<StreamManager>>,
}

impl HttpServer {
    /// Create a server with no route groups and no stream manager.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
            groups: Vec::new(),
            streams: None,
        }
    }

    /// Register a route group. Groups are mounted under the configured prefix.
    pub fn with_group(mut self, group: impl RouteGroup + 'static) -> Self {
        self.groups.push(Box::new(group));
        self
    }

    /// Stream manager the relay serves against and shutdown closes.
    pub fn with_streams(mut self, streams: Arc<StreamManager>) -> Self {
        self.streams = Some(streams);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn handler_names(&self) -> Vec<String> {
        self.groups.iter().map(|group| group.name().to_string()).collect()
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Expects a validated config: a prefix without a leading `/` makes
    /// axum reject the nest. `run` and `serve` validate first.
    pub fn router(&self) -> Router {
        let state = AppState {
            config: Arc::clone(&self.config),
            streams: self.streams.clone(),
            handlers: Arc::new(self.handler_names()),
        };

        let api = self
            .groups
            .iter()
            .fold(Router::new(), |router, group| group.register_routes(router));

        let prefix = self.config.server.prefix.as_str();
        let app = if prefix == "/" {
            Router::new().merge(api)
        } else {
            Router::new().nest(prefix, api)
        };

        let app = app
            .route("/swagger/{*path}", get(docs::swagger))
            .fallback(not_found)
            .with_state(state);

        middleware::apply(app, &self.config)
    }

    fn validate(&self) -> Result<(), ServerError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;
        Ok(())
    }

    /// Bind the configured address and serve until `shutdown` is triggered.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), ServerError> {
        self.validate()?;

        let address = self.config.server.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on a pre-bound listener until `shutdown` is triggered.
    ///
    /// Returns once the listener has stopped, or once the drain deadline
    /// has passed and the remaining connections were abandoned.
    pub async fn serve(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        self.validate()?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let drain = Duration::from_secs(self.config.server.shutdown_timeout_secs);

        tracing::info!("Start server on: {}", addr);
        tracing::info!("server enabled handlers: {:?}", self.handler_names());

        let scope = shutdown.child();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let listener_scope = scope.clone();
        let mut listener_task = tokio::spawn(async move {
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await;
            listener_scope.trigger();
            result
        });

        let streams = self.streams.clone();
        let watcher_task = tokio::spawn(async move {
            scope.wait().await;
            tracing::info!("Closing server");
            if let Some(streams) = streams {
                streams.close_all();
            }
            let _ = stop_tx.send(());
        });

        watcher_task.await?;

        match tokio::time::timeout(drain, &mut listener_task).await {
            Ok(joined) => joined??,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = drain.as_secs(),
                    "Graceful shutdown timed out, abandoning open connections"
                );
                listener_task.abort();
            }
        }

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}

async fn not_found(uri: Uri) -> Response {
    let err = format!("route not found: {}", uri.path());
    respond_failure(&uri, Some(StatusCode::NOT_FOUND), Some(&err))
}
