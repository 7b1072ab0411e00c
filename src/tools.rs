//! Tool trait, the three upstream-backed tools, and the dispatching registry.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 ToolRegistry                  │
//! │  get_insights  get_audience_types  get_audi…  │
//! └──────────────────────┬────────────────────────┘
//!                        ▼
//!   validate → encode → UpstreamClient::fetch → sanitize
//!                        ▼
//!                  ResultEnvelope
//! ```
//!
//! Every invocation is independent: a tool reads its arguments, talks to the
//! upstream once through the shared [`UpstreamClient`], and returns. Nothing
//! is cached between calls.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{Endpoint, UpstreamClient};
use crate::envelope::ResultEnvelope;
use crate::error::ToolError;
use crate::payload::{
    audience_filter, validate_audience_parent_type, validate_insights_payload, RawArgument,
};
use crate::query::{encode_form_query, ListMode};

pub const GET_INSIGHTS: &str = "get_insights";
pub const GET_AUDIENCE_TYPES: &str = "get_audience_types";
pub const GET_AUDIENCE_BY_TYPE: &str = "get_audience_by_type";

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool callers can discover and invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, e.g. `"get_insights"`.
    fn name(&self) -> &str;

    /// One-line description for tool discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the argument object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool and return the sanitized upstream body.
    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext)
        -> Result<Value, ToolError>;
}

/// What a tool gets to work with during one invocation.
#[derive(Clone)]
pub struct ToolContext {
    client: Arc<UpstreamClient>,
}

impl ToolContext {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }
}

/// Serializable tool descriptor for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// ═══════════════════════════════════════════════════════════════════════
// Upstream-backed tools
// ═══════════════════════════════════════════════════════════════════════

/// `get_insights`: entity recommendations for a filter payload.
pub struct InsightsTool;

#[async_trait]
impl Tool for InsightsTool {
    fn name(&self) -> &str {
        GET_INSIGHTS
    }

    fn description(&self) -> &str {
        "Get insights for an entity type and filter set. The payload must contain \
         'filter.type' set to urn:entity:<entity>, e.g. urn:entity:movie."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "payload": {
                    "type": ["object", "string"],
                    "description": "Filter mapping (or its JSON text) with dot-namespaced keys, e.g. {\"filter.type\": \"urn:entity:movie\", \"filter.release_year.min\": 2000}"
                },
                "entity_type": {
                    "type": "string",
                    "description": "Optional urn:entity:<entity>; overrides payload['filter.type']"
                }
            },
            "required": ["payload"]
        })
    }

    async fn execute(
        &self,
        args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<Value, ToolError> {
        let raw = RawArgument::from_value(args.get("payload"))?;
        let payload = validate_insights_payload(raw, args.get("entity_type"))?;

        let query = encode_form_query(payload.as_map(), ListMode::Joined);
        ctx.client().fetch(Endpoint::Insights, &query).await
    }
}

/// `get_audience_types`: list every audience type.
pub struct AudienceTypesTool;

#[async_trait]
impl Tool for AudienceTypesTool {
    fn name(&self) -> &str {
        GET_AUDIENCE_TYPES
    }

    fn description(&self) -> &str {
        "List the available audience types (urn:audience:<kind>)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(
        &self,
        _args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<Value, ToolError> {
        ctx.client().fetch(Endpoint::AudienceTypes, "").await
    }
}

/// `get_audience_by_type`: audiences under one parent type.
pub struct AudienceByTypeTool;

#[async_trait]
impl Tool for AudienceByTypeTool {
    fn name(&self) -> &str {
        GET_AUDIENCE_BY_TYPE
    }

    fn description(&self) -> &str {
        "List audiences belonging to a parent audience type (urn:audience:<kind>)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "parent_type": {
                    "type": "string",
                    "description": "Parent audience type, e.g. urn:audience:communities"
                }
            },
            "required": ["parent_type"]
        })
    }

    async fn execute(
        &self,
        args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<Value, ToolError> {
        let parent_type = validate_audience_parent_type(args.get("parent_type"))?;
        let query = encode_form_query(&audience_filter(parent_type), ListMode::Joined);
        ctx.client().fetch(Endpoint::Audiences, &query).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of tools, looked up by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The three upstream-backed tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(InsightsTool));
        registry.register(Box::new(AudienceTypesTool));
        registry.register(Box::new(AudienceByTypeTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Run one invocation end to end.
    ///
    /// Never fails: unknown names, missing credentials, validation errors,
    /// and upstream failures all come back as an `ok = false` envelope.
    pub async fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> ResultEnvelope {
        let result = match self.find(name) {
            None => Err(ToolError::UnknownTool(name.to_string())),
            Some(tool) => match ctx.client().require_credential() {
                Err(e) => Err(e),
                Ok(_) => tool.execute(args, ctx).await,
            },
        };

        match &result {
            Ok(_) => info!(tool = name, ok = true, "tool call finished"),
            Err(e) => warn!(tool = name, ok = false, error = e.kind(), "tool call failed"),
        }

        ResultEnvelope::from(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
