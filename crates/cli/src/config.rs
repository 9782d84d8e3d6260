//! Proxy configuration: TOML file, then command-line overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use proxy::{
    AccessToken, BranchName, FilePath, RepositoryName, RepositoryOwner, RepositoryTarget,
};
use serde::Deserialize;
use thiserror::Error;

/// Config file read when `--config` is not given. Its absence is not an error.
pub const DEFAULT_CONFIG_FILE: &str = "sync-proxy.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Everything the proxy reads at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    pub listen: SocketAddr,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub default_path: String,
    /// Environment variable holding the GitHub token.
    pub token_env: String,
    pub api_base: String,
    pub user_agent: String,
    /// Prefix of every automatic commit message.
    pub commit_message: String,
    pub request_timeout_secs: u64,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Browser origins allowed by CORS; `"*"` allows any.
    pub allowed_origins: Vec<String>,
    /// OTLP gRPC endpoint; empty disables OpenTelemetry export.
    pub otlp_endpoint: String,
    pub log_format: LogFormat,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            owner: "rubendml".to_string(),
            repo: "numismatica".to_string(),
            branch: "main".to_string(),
            default_path: "data/coleccion.json".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            api_base: github::DEFAULT_API_BASE.to_string(),
            user_agent: concat!("sync-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            commit_message: "Automatic sync".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 10 * 1024 * 1024,
            allowed_origins: vec!["*".to_string()],
            otlp_endpoint: String::new(),
            log_format: LogFormat::Json,
        }
    }
}

impl ProxyConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads `path`. When `required` is false a missing file yields the
    /// defaults.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks every field that can be checked without the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target()?;
        self.default_path()?;
        self.request_timeout()?;
        if self.token_env.trim().is_empty() {
            return Err(invalid("token_env", "must not be empty"));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(invalid("api_base", "must be an http(s) URL"));
        }
        if self.max_body_bytes == 0 {
            return Err(invalid("max_body_bytes", "must be greater than zero"));
        }
        if self.allowed_origins.is_empty() {
            return Err(invalid("allowed_origins", "must list at least one origin"));
        }
        Ok(())
    }

    pub fn target(&self) -> Result<RepositoryTarget, ConfigError> {
        Ok(RepositoryTarget {
            owner: RepositoryOwner::new(self.owner.trim())
                .ok_or_else(|| invalid("owner", "must not be empty"))?,
            repo: RepositoryName::new(self.repo.trim())
                .ok_or_else(|| invalid("repo", "must not be empty"))?,
            branch: BranchName::new(self.branch.trim())
                .ok_or_else(|| invalid("branch", "must not be empty"))?,
        })
    }

    pub fn default_path(&self) -> Result<FilePath, ConfigError> {
        FilePath::new(self.default_path.as_str())
            .ok_or_else(|| invalid("default_path", "must be a repository-relative file path"))
    }

    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        match self.request_timeout_secs {
            0 => Err(invalid("request_timeout_secs", "must be greater than zero")),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    pub fn otlp_endpoint(&self) -> Option<&str> {
        let endpoint = self.otlp_endpoint.trim();
        (!endpoint.is_empty()).then_some(endpoint)
    }

    /// Reads the token from the configured environment variable via `lookup`.
    pub fn read_token(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<AccessToken> {
        lookup(&self.token_env).and_then(AccessToken::new)
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.to_string(),
    }
}
