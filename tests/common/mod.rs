//! Throwaway upstream API for integration tests.
//!
//! Serves one canned response for every path and records each request it
//! receives so tests can assert on path, raw query, and headers, or on the
//! absence of any request at all.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use insights_mcp::client::UpstreamClient;
use insights_mcp::tools::ToolContext;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_KEY: &str = "test-key";

#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub accept: Option<String>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    delay: Duration,
    hits: Arc<Mutex<Vec<Hit>>>,
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockUpstream {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, body: &str, delay: Duration) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            delay,
            hits: hits.clone(),
        };

        let app = Router::new().fallback(handle).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, hits }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn ctx(&self, api_key: Option<&str>) -> ToolContext {
        self.ctx_with_timeout(api_key, Duration::from_secs(5))
    }

    pub fn ctx_with_timeout(&self, api_key: Option<&str>, timeout: Duration) -> ToolContext {
        let client =
            UpstreamClient::new(self.base_url(), api_key.map(String::from), timeout).unwrap();
        ToolContext::new(Arc::new(client))
    }
}

async fn handle(State(state): State<MockState>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    state.hits.lock().unwrap().push(Hit {
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        api_key: header("x-api-key"),
        accept: header("accept"),
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (state.status, state.body)
}

pub fn args(v: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match v {
        serde_json::Value::Object(m) => m,
        _ => panic!("expected object"),
    }
}
