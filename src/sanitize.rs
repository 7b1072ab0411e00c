//! Response sanitization.
//!
//! Upstream results carry bookkeeping fields (ids, popularity scores,
//! external references, alternate titles) that are noise for a tool caller.
//! Each [`RecordKind`] names the list it lives under in `results` and the
//! keys to drop from each record in that list.
//!
//! Removal is order-preserving, never adds anything, and is idempotent.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ToolError;

const ENTITY_KEYS: &[&str] = &[
    "entity_id",
    "type",
    "subtype",
    "popularity",
    "tags",
    "query",
    "disambiguation",
    "external",
];

const ENTITY_PROPERTY_KEYS: &[&str] = &[
    "format",
    "isbn10",
    "isbn13",
    "publication_year",
    "short_description",
    "short_descriptions",
    "release_year",
    "content_rating",
    "akas",
    "keywords",
];

const AUDIENCE_KEYS: &[&str] = &[
    "entity_id",
    "parents",
    "type",
    "id",
    "disambiguation",
    "tags",
];

const AUDIENCE_TYPE_KEYS: &[&str] = &["parents"];

/// The shapes of record list the upstream returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `results.entities` from the insights endpoint.
    Entities,
    /// `results.audiences` from the audiences endpoint.
    Audiences,
    /// `results.audience_types` from the audience types endpoint.
    AudienceTypes,
}

impl RecordKind {
    /// Key under `results` holding the record list.
    pub fn collection_key(self) -> &'static str {
        match self {
            RecordKind::Entities => "entities",
            RecordKind::Audiences => "audiences",
            RecordKind::AudienceTypes => "audience_types",
        }
    }

    /// Top-level keys removed from every record.
    pub fn removed_keys(self) -> &'static [&'static str] {
        match self {
            RecordKind::Entities => ENTITY_KEYS,
            RecordKind::Audiences => AUDIENCE_KEYS,
            RecordKind::AudienceTypes => AUDIENCE_TYPE_KEYS,
        }
    }

    /// Keys removed from a record's nested `properties` object.
    pub fn removed_property_keys(self) -> &'static [&'static str] {
        match self {
            RecordKind::Entities => ENTITY_PROPERTY_KEYS,
            RecordKind::Audiences | RecordKind::AudienceTypes => &[],
        }
    }
}

/// Strip `kind`'s keys from every record in `body.results.<collection>`.
///
/// Missing `results`, a missing collection, or a non-list collection leave
/// the body as is. Returns the number of keys removed.
pub fn sanitize(body: &mut Value, kind: RecordKind) -> usize {
    let Some(records) = body
        .get_mut("results")
        .and_then(|r| r.get_mut(kind.collection_key()))
        .and_then(Value::as_array_mut)
    else {
        return 0;
    };

    let mut removed = 0;
    for record in records.iter_mut().filter_map(Value::as_object_mut) {
        removed += strip_keys(record, kind.removed_keys());

        let property_keys = kind.removed_property_keys();
        if property_keys.is_empty() {
            continue;
        }
        if let Some(props) = record.get_mut("properties").and_then(Value::as_object_mut) {
            removed += strip_keys(props, property_keys);
        }
    }
    removed
}

/// Parse an upstream body and sanitize it.
pub fn parse_and_sanitize(body: &str, kind: RecordKind) -> Result<Value, ToolError> {
    let mut value: Value = serde_json::from_str(body)
        .map_err(|e| ToolError::InvalidUpstreamResponse(e.to_string()))?;
    let removed = sanitize(&mut value, kind);
    debug!(kind = kind.collection_key(), removed, "sanitized upstream response");
    Ok(value)
}

fn strip_keys(record: &mut Map<String, Value>, keys: &[&str]) -> usize {
    keys.iter()
        .filter(|key| record.shift_remove(**key).is_some())
        .count()
}
