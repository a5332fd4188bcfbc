//! Shared helpers: boot the gateway on an ephemeral port over the demo fleet.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;

use binthere_gateway::config::GatewayConfig;
use binthere_gateway::server::{build_app, build_state};

/// Address of a running test server.
#[derive(Debug, Clone, Copy)]
pub struct TestServer {
    /// Bound socket.
    pub addr: SocketAddr,
}

impl TestServer {
    /// `http://` URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// `ws://` URL of the event stream.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Starts a fresh server with its own seeded in-memory store.
pub async fn spawn() -> TestServer {
    spawn_with(GatewayConfig::demo()).await
}

/// Starts a server with a custom configuration.
pub async fn spawn_with(config: GatewayConfig) -> TestServer {
    let Ok(state) = build_state(&config).await else {
        panic!("state bootstrap failed");
    };
    let app = build_app(state, &config);
    let Ok(listener) = tokio::net::TcpListener::bind(config.listen_addr).await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    TestServer { addr }
}

/// Sends a request and returns status plus JSON body.
pub async fn send(request: reqwest::RequestBuilder) -> (u16, serde_json::Value) {
    let Ok(response) = request.send().await else {
        panic!("request failed");
    };
    let status = response.status().as_u16();
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("response body is not JSON");
    };
    (status, body)
}

/// Logs in as the seeded admin and returns the bearer token.
pub async fn admin_token(client: &reqwest::Client, server: &TestServer) -> String {
    let (status, body) = send(
        client
            .post(server.url("/api/v1/auth/login"))
            .json(&serde_json::json!({"email": "admin@binthere.com", "password": "admin123"})),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    let Some(token) = body.get("token").and_then(|v| v.as_str()) else {
        panic!("login response without token: {body}");
    };
    token.to_string()
}

/// String field lookup on a JSON object.
pub fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(serde_json::Value::as_str)
}
