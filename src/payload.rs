//! Filter payload validation and normalization.
//!
//! Tool arguments arrive either as an already-structured JSON object or as a
//! string holding JSON text. [`RawArgument`] names both shapes; the
//! validators below normalize them into a [`FilterPayload`] on a private
//! copy, so the caller's value is never touched.

use serde_json::{Map, Value};

use crate::error::ToolError;

/// Required prefix for `filter.type`.
pub const ENTITY_URN_PREFIX: &str = "urn:entity:";
/// Required prefix for audience parent types.
pub const AUDIENCE_URN_PREFIX: &str = "urn:audience:";
/// Key holding the entity type in an insights payload.
pub const FILTER_TYPE_KEY: &str = "filter.type";
/// Key holding the parent audience type in an audiences query.
pub const PARENT_TYPES_KEY: &str = "filter.parents.types";
pub const TAKE_KEY: &str = "take";
pub const DEFAULT_TAKE: u64 = 10;

/// A tool argument before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArgument {
    JsonText(String),
    Structured(Map<String, Value>),
}

impl RawArgument {
    /// Classify an optional argument value.
    ///
    /// Absent and `null` are [`ToolError::EmptyPayload`]; any non-string,
    /// non-object value is [`ToolError::InvalidPayloadType`].
    pub fn from_value(value: Option<&Value>) -> Result<Self, ToolError> {
        match value {
            None | Some(Value::Null) => Err(ToolError::EmptyPayload),
            Some(Value::String(s)) => Ok(RawArgument::JsonText(s.clone())),
            Some(Value::Object(m)) => Ok(RawArgument::Structured(m.clone())),
            Some(other) => Err(ToolError::InvalidPayloadType(json_type_name(other))),
        }
    }

    /// Parse (if needed) into a JSON object with null entries dropped.
    fn into_object(self) -> Result<Map<String, Value>, ToolError> {
        let map = match self {
            RawArgument::JsonText(text) => {
                if text.trim().is_empty() {
                    return Err(ToolError::EmptyPayload);
                }
                let parsed: Value = serde_json::from_str(&text)
                    .map_err(|e| ToolError::InvalidJson(e.to_string()))?;
                match parsed {
                    Value::Object(m) => m,
                    Value::Null => return Err(ToolError::EmptyPayload),
                    other => return Err(ToolError::InvalidPayloadType(json_type_name(&other))),
                }
            }
            RawArgument::Structured(m) => m,
        };

        if map.is_empty() {
            return Err(ToolError::EmptyPayload);
        }

        Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
    }
}

/// A validated insights filter mapping.
///
/// Guaranteed to hold a `filter.type` string prefixed `urn:entity:` and a
/// `take` entry. Keys keep their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPayload(Map<String, Value>);

impl FilterPayload {
    pub fn entity_type(&self) -> &str {
        self.0
            .get(FILTER_TYPE_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Validate an insights payload.
///
/// When `entity_type` is given it overrides whatever `filter.type` the
/// payload carried and is held to the same `urn:entity:` rule; `null`
/// counts as absent. `take` defaults to 10.
pub fn validate_insights_payload(
    raw: RawArgument,
    entity_type: Option<&Value>,
) -> Result<FilterPayload, ToolError> {
    let mut map = raw.into_object()?;

    match entity_type {
        None | Some(Value::Null) => {}
        Some(Value::String(t)) => {
            map.insert(FILTER_TYPE_KEY.to_string(), Value::String(t.clone()));
        }
        Some(_) => return Err(ToolError::MissingOrInvalidEntityType),
    }

    let valid_type = map
        .get(FILTER_TYPE_KEY)
        .and_then(Value::as_str)
        .is_some_and(|t| t.starts_with(ENTITY_URN_PREFIX));
    if !valid_type {
        return Err(ToolError::MissingOrInvalidEntityType);
    }

    if !map.contains_key(TAKE_KEY) {
        map.insert(TAKE_KEY.to_string(), Value::from(DEFAULT_TAKE));
    }

    Ok(FilterPayload(map))
}

/// Validate an audience parent type and return it as a `&str`.
pub fn validate_audience_parent_type(value: Option<&Value>) -> Result<&str, ToolError> {
    match value.and_then(Value::as_str) {
        Some(t) if !t.is_empty() && t.starts_with(AUDIENCE_URN_PREFIX) => Ok(t),
        _ => Err(ToolError::InvalidAudienceParentType),
    }
}

/// Build the single-key filter mapping for an audiences lookup.
pub fn audience_filter(parent_type: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        PARENT_TYPES_KEY.to_string(),
        Value::String(parent_type.to_string()),
    );
    map
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
