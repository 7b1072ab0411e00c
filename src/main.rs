//! # Insights MCP CLI (`insights-mcp`)
//!
//! ## Usage
//!
//! ```bash
//! insights-mcp --config ./config/insights.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `insights-mcp serve` | Start the MCP-compatible HTTP server |
//! | `insights-mcp tools` | List the available tools |
//! | `insights-mcp call <tool>` | Run one tool call and print the result envelope |
//!
//! ## Examples
//!
//! ```bash
//! export QLOO_API_KEY=...
//! insights-mcp serve --bind 0.0.0.0:8000
//! insights-mcp call get_audience_types
//! insights-mcp call get_insights --args '{"payload": {"filter.type": "urn:entity:movie"}}'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insights_mcp::client::UpstreamClient;
use insights_mcp::config::{self, Config};
use insights_mcp::server;
use insights_mcp::tools::{ToolContext, ToolRegistry};

/// Insights MCP: entity insights and audience lookups as MCP tools.
#[derive(Parser)]
#[command(name = "insights-mcp", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/insights.toml")]
    config: PathBuf,

    /// Log level when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (MCP at `/mcp`, REST at `/tools/*`).
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// List the available tools.
    Tools,

    /// Run a single tool call and print the result envelope as JSON.
    Call {
        /// Tool name, e.g. `get_insights`.
        name: String,

        /// Argument object as JSON text.
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn load(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut cfg = load(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Tools => {
            let registry = ToolRegistry::with_builtins();
            println!("{:<24} DESCRIPTION", "TOOL");
            for t in registry.tools() {
                println!("{:<24} {}", t.name(), t.description());
            }
        }
        Commands::Call { name, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be JSON")?;
            let serde_json::Value::Object(args) = args else {
                anyhow::bail!("--args must be a JSON object");
            };

            let client = UpstreamClient::from_config(&cfg).context("Failed to build HTTP client")?;
            let ctx = ToolContext::new(Arc::new(client));
            let envelope = ToolRegistry::with_builtins()
                .dispatch(&name, &args, &ctx)
                .await;
            println!("{}", envelope.to_json_text());
        }
    }

    Ok(())
}
