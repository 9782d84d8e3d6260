//! Sync proxy entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** — load `sync-proxy.toml` (or `--config`), apply
//!    command-line overrides and validate the result.
//! 2. **Wire observability** — configure `tracing-subscriber` with a JSON layer
//!    and, when `otlp_endpoint` is set, an OpenTelemetry OTLP exporter. All
//!    `tracing` spans and events emitted by every crate in the workspace flow
//!    through this layer.
//! 3. **Construct infrastructure** — read the GitHub token from the configured
//!    environment variable, create the `GithubContentsClient`, and inject it
//!    into `SyncProxy`.
//! 4. **Serve** — run the HTTP listener until Ctrl-C or SIGTERM.
//!
//! A missing token does not stop the server: it starts, logs a warning, and
//! answers every sync request with 500.

mod config;
mod telemetry;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::{GithubClientConfig, GithubContentsClient};
use listener::ServerConfig;
use proxy::{SyncProxy, SyncSettings};
use tracing::{info, warn};

use crate::config::{LogFormat, ProxyConfig, DEFAULT_CONFIG_FILE};

/// Server-side proxy that reads and writes a JSON file in a GitHub repository.
#[derive(Debug, Parser)]
#[command(name = "sync-proxy", version, about)]
struct Cli {
    /// Path of the TOML config file [default: sync-proxy.toml, optional]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Log output format, overriding the config file
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn load_config(cli: &Cli) -> anyhow::Result<ProxyConfig> {
    let mut config = match &cli.config {
        Some(path) => ProxyConfig::load(path, true)?,
        None => ProxyConfig::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    let target = config.target()?;
    info!(repo = %target, listen = %config.listen, "starting sync proxy");

    let token = config.read_token(|name| std::env::var(name).ok());
    let client = GithubContentsClient::new(GithubClientConfig {
        api_base: config.api_base.clone(),
        user_agent: config.user_agent.clone(),
        timeout: config.request_timeout()?,
        target,
    })
    .context("failed to create GitHub client")?;

    let proxy = SyncProxy::new(
        Arc::new(client),
        token,
        SyncSettings {
            default_path: config.default_path()?,
            commit_message_prefix: config.commit_message.clone(),
            token_setting: config.token_env.clone(),
        },
    );
    if !proxy.has_credential() {
        warn!(
            variable = %config.token_env,
            "GitHub token is not set; sync requests will fail with 500"
        );
    }

    listener::serve(
        ServerConfig {
            listen: config.listen,
            allowed_origins: config.allowed_origins.clone(),
            max_body_bytes: config.max_body_bytes,
        },
        Arc::new(proxy),
        shutdown_signal(),
    )
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint())?;

    let result = run(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "sync proxy exited with an error");
    }
    telemetry.shutdown();
    result
}
