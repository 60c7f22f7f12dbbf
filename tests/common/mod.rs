//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{Method, Request};
use switchyard::{App, AppConfig, RawRequest};
use tokio::sync::oneshot;

/// Config bound to loopback so tests never listen on public interfaces.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.host = "127.0.0.1".into();
    config
}

/// Start `app` on an ephemeral port and return the bound address.
#[allow(dead_code)]
pub async fn spawn_app(app: App) -> SocketAddr {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = app
            .listen(0, move |addr| {
                let _ = tx.send(addr);
            })
            .await;
        if let Err(e) = result {
            eprintln!("test server exited: {e}");
        }
    });
    rx.await.expect("server failed to bind")
}

/// Build an in-process request with optional headers.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> RawRequest {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::new()).unwrap().into()
}
