//! Form-encoded query strings for upstream requests.
//!
//! Keys and values are percent-encoded with nothing treated as safe beyond
//! the RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`), so a space becomes
//! `%20` and `:` becomes `%3A`. Output order follows the payload's
//! insertion order.
//!
//! List values have two shapes:
//!
//! | Mode | `{"k": ["a", "b c"]}` |
//! |------|-----------------------|
//! | joined (default) | `k=a,b%20c` |
//! | exploded | `k=a&k=b%20c` |

use serde_json::{Map, Value};
use urlencoding::encode;

/// How list values are laid out in the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListMode {
    /// One `key=v1,v2` parameter; the comma stays literal.
    #[default]
    Joined,
    /// One `key=v` parameter per element.
    Exploded,
}

/// Encode a key→value mapping into a query string (without the leading `?`).
///
/// `null` values are skipped, including `null` list elements. Everything
/// that is not a string is encoded from its JSON text, so `3` → `3`,
/// `true` → `true`.
pub fn encode_form_query(data: &Map<String, Value>, mode: ListMode) -> String {
    let mut params: Vec<String> = Vec::with_capacity(data.len());

    for (key, value) in data {
        if value.is_null() {
            continue;
        }
        let key = encode(key);

        match value {
            Value::Array(items) => match mode {
                ListMode::Exploded => {
                    for item in items.iter().filter(|v| !v.is_null()) {
                        params.push(format!("{}={}", key, encode_scalar(item)));
                    }
                }
                ListMode::Joined => {
                    let joined = items
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(encode_scalar)
                        .collect::<Vec<_>>()
                        .join(",");
                    params.push(format!("{}={}", key, joined));
                }
            },
            other => params.push(format!("{}={}", key, encode_scalar(other))),
        }
    }

    params.join("&")
}

fn encode_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => encode(s).into_owned(),
        other => encode(&other.to_string()).into_owned(),
    }
}
