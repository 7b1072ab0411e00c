//! # Insights MCP
//!
//! An MCP tool server that turns tool calls into authenticated requests
//! against an upstream entity-graph API (entity insights and audiences) and
//! returns trimmed-down JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐   ┌───────────┐
//! │ MCP/REST │──▶│ Validator │──▶│ Encoder │──▶│ Upstream │──▶│ Sanitizer │
//! │ (tools)  │   │ (payload) │   │ (query) │   │ (client) │   │           │
//! └──────────┘   └───────────┘   └─────────┘   └──────────┘   └─────┬─────┘
//!       ▲                                                           │
//!       └─────────────────────── ResultEnvelope ◀───────────────────┘
//! ```
//!
//! ## Tools
//!
//! | Tool | Upstream | Arguments |
//! |------|----------|-----------|
//! | `get_insights` | `GET /v2/insights` | `payload`, optional `entity_type` |
//! | `get_audience_types` | `GET /v2/audiences/types` | none |
//! | `get_audience_by_type` | `GET /v2/audiences` | `parent_type` |
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credential lookup |
//! | [`error`] | Per-invocation error taxonomy |
//! | [`envelope`] | `{ok, data, error, status_code}` result wrapper |
//! | [`query`] | Form-encoded query strings |
//! | [`payload`] | Filter payload validation and defaults |
//! | [`sanitize`] | Field stripping for upstream records |
//! | [`client`] | Upstream HTTP client |
//! | [`tools`] | `Tool` trait, the three tools, registry dispatch |
//! | [`mcp`] | MCP JSON-RPC bridge (rmcp) |
//! | [`server`] | Axum HTTP server |

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod mcp;
pub mod payload;
pub mod query;
pub mod sanitize;
pub mod server;
pub mod tools;

pub use client::{Endpoint, UpstreamClient};
pub use envelope::ResultEnvelope;
pub use error::ToolError;
pub use tools::{Tool, ToolContext, ToolRegistry};
