//! Upstream HTTP client.
//!
//! One `GET` per invocation against a fixed endpoint, with a per-call
//! timeout covering connect, send, and body read. Outcomes map onto
//! [`ToolError`] as follows:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | no API key configured | `MissingCredential`, no request sent |
//! | DNS / connect / TLS / timeout | `Network` |
//! | HTTP 200, JSON body | sanitized body |
//! | HTTP 200, non-JSON body | `InvalidUpstreamResponse` |
//! | any other status | `UpstreamHttp { status, body }` |
//!
//! There are no retries. Dropping the future returned by [`UpstreamClient::fetch`]
//! aborts the in-flight request.

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ToolError;
use crate::sanitize::{parse_and_sanitize, RecordKind};

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// The fixed upstream endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Insights,
    Audiences,
    AudienceTypes,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Insights => "/v2/insights",
            Endpoint::Audiences => "/v2/audiences",
            Endpoint::AudienceTypes => "/v2/audiences/types",
        }
    }

    /// How this endpoint's response is sanitized.
    pub fn record_kind(self) -> RecordKind {
        match self {
            Endpoint::Insights => RecordKind::Entities,
            Endpoint::Audiences => RecordKind::Audiences,
            Endpoint::AudienceTypes => RecordKind::AudienceTypes,
        }
    }
}

/// Client for the upstream entity-graph API.
///
/// The credential is fixed at construction. The inner `reqwest::Client`
/// pools connections but carries no per-call state.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<HeaderValue>,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl UpstreamClient {
    /// Build a client for `base_url`.
    ///
    /// The key is trimmed. A blank key, or one that cannot travel in an HTTP
    /// header, is dropped, so calls fail with
    /// [`ToolError::MissingCredential`] before any request is sent.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_key = api_key.and_then(|key| key_header(&key));
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Build from config, resolving the API key once.
    pub fn from_config(config: &Config) -> Result<Self, ToolError> {
        Self::new(
            config.upstream.base_url.clone(),
            config.api_key(),
            Duration::from_secs(config.upstream.timeout_secs),
        )
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fail fast when no API key is configured.
    pub fn require_credential(&self) -> Result<&HeaderValue, ToolError> {
        self.api_key.as_ref().ok_or(ToolError::MissingCredential)
    }

    /// Full request URL for `endpoint` with an already-encoded query.
    pub fn url_for(&self, endpoint: Endpoint, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.base_url, endpoint.path())
        } else {
            format!("{}{}?{}", self.base_url, endpoint.path(), query)
        }
    }

    /// `GET` `endpoint` with `query` and return the sanitized JSON body.
    pub async fn fetch(&self, endpoint: Endpoint, query: &str) -> Result<Value, ToolError> {
        let key_header = self.require_credential()?.clone();
        let url = self.url_for(endpoint, query);

        debug!(endpoint = endpoint.path(), query, "sending upstream request");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, key_header)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        info!(
            endpoint = endpoint.path(),
            status = status.as_u16(),
            bytes = body.len(),
            "upstream responded"
        );

        if status != StatusCode::OK {
            return Err(ToolError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        parse_and_sanitize(&body, endpoint.record_kind())
    }
}

fn key_header(key: &str) -> Option<HeaderValue> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    match HeaderValue::from_str(key) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            warn!("API key contains characters not allowed in a header; ignoring it");
            None
        }
    }
}
