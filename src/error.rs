//! Error taxonomy for a single tool invocation.
//!
//! Every variant is recoverable at the invocation boundary: the dispatcher
//! turns it into a [`ResultEnvelope`](crate::envelope::ResultEnvelope) with
//! `ok = false`. The `Display` text of each variant is exactly what lands in
//! the envelope's `error` field.

use thiserror::Error;

/// Failure of one tool invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The payload argument was absent, `null`, blank, or an empty object.
    #[error("payload must not be empty")]
    EmptyPayload,

    /// The payload was a string that did not parse as JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// The payload parsed, but not into a JSON object.
    #[error("payload must be a JSON object, got {0}")]
    InvalidPayloadType(&'static str),

    /// `filter.type` missing or not prefixed `urn:entity:`.
    #[error("payload must contain 'filter.type' starting with 'urn:entity:'")]
    MissingOrInvalidEntityType,

    /// Audience parent type missing, empty, or not prefixed `urn:audience:`.
    #[error("parent type must start with 'urn:audience:'")]
    InvalidAudienceParentType,

    /// No API key configured; the upstream is never contacted.
    #[error("credential required")]
    MissingCredential,

    /// DNS, connect, TLS, or timeout failure talking to the upstream.
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with a status other than 200. Carries the raw body.
    #[error("{body}")]
    UpstreamHttp { status: u16, body: String },

    /// Upstream answered 200 with a body that is not JSON.
    #[error("invalid JSON response from upstream: {0}")]
    InvalidUpstreamResponse(String),

    /// The caller named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// HTTP status to surface in the envelope, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ToolError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable machine-readable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::EmptyPayload => "empty_payload",
            ToolError::InvalidJson(_) => "invalid_json",
            ToolError::InvalidPayloadType(_) => "invalid_payload_type",
            ToolError::MissingOrInvalidEntityType => "missing_or_invalid_entity_type",
            ToolError::InvalidAudienceParentType => "invalid_audience_parent_type",
            ToolError::MissingCredential => "missing_credential",
            ToolError::Network(_) => "network_error",
            ToolError::UpstreamHttp { .. } => "upstream_http_error",
            ToolError::InvalidUpstreamResponse(_) => "invalid_upstream_response",
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::Network(err.to_string())
    }
}
