//! HTTP server.
//!
//! Hosts the MCP Streamable HTTP endpoint and a plain JSON API over the same
//! [`ToolRegistry`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/mcp` | MCP Streamable HTTP (stateless) |
//! | `GET`  | `/tools/list` | List tools with parameter schemas |
//! | `POST` | `/tools/{name}` | Call a tool; body is the argument object |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `POST /tools/{name}` always answers with a result envelope. Unknown tool
//! names get HTTP 404, everything else HTTP 200 with `ok` telling the story.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::client::UpstreamClient;
use crate::config::Config;
use crate::mcp::McpBridge;
use crate::tools::{ToolContext, ToolInfo, ToolRegistry};

/// Shared state passed to route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
}

/// Starts the server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let client = UpstreamClient::from_config(config).context("Failed to build HTTP client")?;
    if !client.has_credential() {
        warn!(
            env = %config.upstream.api_key_env,
            "no upstream API key configured; every tool call will fail with 'credential required'"
        );
    }

    let tools = Arc::new(ToolRegistry::with_builtins());
    let ctx = ToolContext::new(Arc::new(client));
    let app = build_router(tools, ctx);

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(addr = %bind_addr, upstream = %config.upstream.base_url, "MCP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the full router. Exposed for embedding and tests.
pub fn build_router(tools: Arc<ToolRegistry>, ctx: ToolContext) -> Router {
    let bridge = McpBridge::new(tools.clone(), ctx.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .with_state(AppState { tools, ctx })
        .nest_service("/mcp", mcp_service)
        .layer(cors)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.infos(),
    })
}

// ============ POST /tools/{name} ============

/// Unified tool dispatch. An empty or non-object body is treated as no
/// arguments.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Response {
    let args = match body {
        Some(Json(Value::Object(map))) => map,
        _ => Map::new(),
    };

    let status = if state.tools.find(&name).is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    let envelope = state.tools.dispatch(&name, &args, &state.ctx).await;
    (status, Json(envelope)).into_response()
}
