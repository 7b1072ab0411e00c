//! Uniform result wrapper returned by every tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Outcome of one tool invocation.
///
/// Exactly one of `data` / `error` is set. Absent fields are not serialized,
/// so a success looks like `{"ok":true,"data":{...}}` and an upstream
/// failure like `{"ok":false,"error":"...","status_code":500}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ResultEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            status_code: None,
        }
    }

    pub fn failure(err: &ToolError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(err.to_string()),
            status_code: err.status_code(),
        }
    }

    /// Pretty JSON text, as handed back to MCP clients.
    pub fn to_json_text(&self) -> String {
        // Serializing a struct of plain JSON values cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| String::from("{\"ok\":false}"))
    }
}

impl From<Result<Value, ToolError>> for ResultEnvelope {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(data) => ResultEnvelope::success(data),
            Err(err) => ResultEnvelope::failure(&err),
        }
    }
}
