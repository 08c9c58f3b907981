//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use chat_gateway::config::GatewayConfig;
use chat_gateway::{EventsRoutes, HttpServer, ServerError, Shutdown, StreamManager, SystemRoutes};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A gateway serving on an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub streams: Arc<StreamManager>,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a gateway with the built-in route groups and a stream manager.
pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let streams = Arc::new(StreamManager::new(config.streams.clone()));
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config)
        .with_streams(Arc::clone(&streams))
        .with_group(SystemRoutes)
        .with_group(EventsRoutes);
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    TestGateway {
        addr,
        shutdown,
        streams,
        handle,
    }
}

/// Default config with a short drain so shutdown tests stay fast.
#[allow(dead_code)]
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.shutdown_timeout_secs = 2;
    config
}
