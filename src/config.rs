//! TOML configuration.
//!
//! ```toml
//! [upstream]
//! base_url = "https://hackathon.api.qloo.com"
//! api_key_env = "QLOO_API_KEY"
//! timeout_secs = 30
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! ```
//!
//! The API key is read once, at startup, by [`Config::api_key`]. It is never
//! written back into the config or logged.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://hackathon.api.qloo.com";
/// Environment variable consulted for the base URL when no config file exists.
pub const BASE_URL_ENV: &str = "QLOO_API";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Inline key; the environment variable wins when both are set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_api_key_env() -> String {
    "QLOO_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    /// Defaults for running without a config file.
    pub fn minimal() -> Self {
        let mut upstream = UpstreamConfig::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                upstream.base_url = url;
            }
        }
        Self {
            upstream,
            server: ServerConfig::default(),
        }
    }

    /// Resolve the upstream credential.
    ///
    /// Environment variable named by `api_key_env` first, then the inline
    /// `api_key`. Surrounding whitespace is trimmed and blank values count as
    /// absent.
    pub fn api_key(&self) -> Option<String> {
        let clean = |k: String| {
            let k = k.trim();
            (!k.is_empty()).then(|| k.to_string())
        };
        std::env::var(&self.upstream.api_key_env)
            .ok()
            .and_then(clean)
            .or_else(|| self.upstream.api_key.clone().and_then(clean))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let url = &config.upstream.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!(
            "upstream.base_url must start with http:// or https://, got '{}'",
            url
        );
    }

    if config.upstream.timeout_secs == 0 {
        anyhow::bail!("upstream.timeout_secs must be > 0");
    }

    if config.upstream.api_key_env.trim().is_empty() {
        anyhow::bail!("upstream.api_key_env must not be empty");
    }

    Ok(())
}
