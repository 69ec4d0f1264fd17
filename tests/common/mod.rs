//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use edge_guard::audit::{AuditLog, MemoryAuditSink};
use edge_guard::config::{EndpointQuota, GuardConfig};
use edge_guard::http::{FunctionHandler, HandlerError, HttpServer, Invocation};
use async_trait::async_trait;
use edge_guard::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A running server plus the handles a test needs.
pub struct TestServer {
    pub addr: SocketAddr,
    pub audit: MemoryAuditSink,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a JSON body to a function endpoint.
    pub async fn post_json(&self, endpoint: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/functions/{}", endpoint)))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("server unreachable")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with the limiter sweep disabled so tests are deterministic.
pub fn test_config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.rate_limit.sweep_probability = 0.0;
    config
        .rate_limit
        .endpoints
        .insert("tiny".into(), EndpointQuota::new(2, 60_000));
    config
}

/// Start a server on an ephemeral port.
pub async fn start_server(config: GuardConfig) -> TestServer {
    start_server_with(config, Vec::new()).await
}

/// Start a server with extra handlers registered.
pub async fn start_server_with(
    config: GuardConfig,
    handlers: Vec<(&str, Arc<dyn FunctionHandler>)>,
) -> TestServer {
    let audit = MemoryAuditSink::new();
    let mut server = HttpServer::with_audit(config, AuditLog::new(Arc::new(audit.clone())));
    for (endpoint, handler) in handlers {
        server = server.with_handler(endpoint, handler);
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        audit,
        shutdown,
        client: reqwest::Client::builder().no_proxy().build().unwrap(),
    }
}

/// Returns the sanitized payload and caller details it was given.
pub struct EchoHandler;

#[async_trait]
impl FunctionHandler for EchoHandler {
    async fn call(&self, invocation: Invocation) -> Result<serde_json::Value, HandlerError> {
        Ok(serde_json::json!({
            "payload": invocation.payload,
            "user_id": invocation.user_id,
            "client_ip": invocation.client_ip,
            "user_agent": invocation.user_agent,
        }))
    }
}
