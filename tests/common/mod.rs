//! Shared utilities for integration testing.

use std::net::SocketAddr;

use request_echo::{EchoConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// An echo server running on an ephemeral local port.
///
/// Shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    /// Start a server with the default configuration.
    pub async fn start() -> Self {
        Self::start_with(EchoConfig::default()).await
    }

    /// Start a server with `config`. The bind address is always 127.0.0.1:0
    /// and request logging is off.
    pub async fn start_with(mut config: EchoConfig) -> Self {
        config.observability.log_requests = false;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config);
        let server_shutdown = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// HTTP client that bypasses any system proxy and does not pool connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
