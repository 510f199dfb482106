//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;

use ssn_validation_service::security::RateLimiter;
use ssn_validation_service::{HttpServer, ServiceConfig, Shutdown};
use tokio::net::TcpListener;

/// A running service on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config bound to localhost with the given limit.
#[allow(dead_code)]
pub fn config_with_limit(requests_per_minute: u32) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.rate_limit.requests_per_minute = requests_per_minute;
    config
}

#[allow(dead_code)]
pub async fn start_server(config: ServiceConfig) -> TestServer {
    let server = HttpServer::new(config);
    spawn(server).await
}

#[allow(dead_code)]
pub async fn start_server_with_limiter(config: ServiceConfig, limiter: Arc<RateLimiter>) -> TestServer {
    let server = HttpServer::with_limiter(config, limiter);
    spawn(server).await
}

async fn spawn(server: HttpServer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
