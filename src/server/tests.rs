use super::{HealthResponse, HttpServer, HttpServerBuilder};
use crate::config::ServerConfig;
use crate::lifecycle::{Component, ComponentState, Manager, ReadySignal, ShutdownContext};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn create_test_config(port: u16) -> ServerConfig {
    ServerConfig {
        ip: "127.0.0.1".to_string(),
        port,
        start_timeout_seconds: 5,
    }
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[test]
fn test_http_server_builder() {
    let server = HttpServerBuilder::new()
        .config(create_test_config(8080))
        .start_timeout(Duration::from_millis(250))
        .build()
        .unwrap();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.start_timeout(), Duration::from_millis(250));
    assert_eq!(server.name(), "http_server");
    assert!(server.local_addr().is_none());
}

#[test]
fn test_http_server_builder_requires_config() {
    assert!(HttpServer::builder().build().is_err());
}

#[test]
fn test_start_timeout_defaults_to_config() {
    let server = HttpServer::new(create_test_config(0));
    assert_eq!(server.start_timeout(), Duration::from_secs(5));
}

#[tokio::test]
async fn test_serves_until_shutdown() {
    let server = Arc::new(HttpServer::new(create_test_config(0)));
    let (ready, ready_receiver) = ReadySignal::pair();

    let running = Arc::clone(&server);
    let task = tokio::spawn(async move { running.start(ready).await });
    ready_receiver.await.unwrap();

    let addr = server.local_addr().unwrap();
    let ping = http_get(addr, "/ping").await;
    assert!(ping.starts_with("HTTP/1.1 200"));
    assert!(ping.ends_with("pong"));

    let health = http_get(addr, "/health").await;
    let body = health.split("\r\n\r\n").nth(1).unwrap();
    let parsed: HealthResponse = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.status, "ok");

    server
        .shutdown(ShutdownContext::with_timeout(Duration::from_secs(5)))
        .await
        .unwrap();
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_shutdown_before_start_returns_immediately() {
    let server = HttpServer::new(create_test_config(0));

    server
        .shutdown(ShutdownContext::with_timeout(Duration::from_secs(1)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_managed_server_lifecycle() {
    let server = Arc::new(HttpServer::new(create_test_config(0)));
    let mut manager = Manager::new();
    manager.register(server.clone()).unwrap();

    let mut errors = manager.start().await;
    assert!(errors.try_recv().is_err());
    assert_eq!(
        manager.component_state("http_server"),
        Some(ComponentState::Running)
    );

    let addr = server.local_addr().unwrap();
    assert!(http_get(addr, "/ping").await.ends_with("pong"));

    manager
        .shutdown(
            ShutdownContext::with_timeout(Duration::from_secs(5)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(
        manager.component_state("http_server"),
        Some(ComponentState::Stopped)
    );

    // Serve loop returned cleanly, so nothing is reported
    assert!(errors.recv().await.is_none());
}

#[tokio::test]
async fn test_bind_failure_aborts_startup() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut manager = Manager::new();
    manager
        .register(Arc::new(HttpServer::new(create_test_config(port))))
        .unwrap();

    let mut errors = manager.start().await;
    let failure = errors.try_recv().unwrap();

    assert_eq!(failure.component(), Some("http_server"));
    assert!(!failure.is_timeout());
    assert!(failure.to_string().contains("failed to bind"));
}
