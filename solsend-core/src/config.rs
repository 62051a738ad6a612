//! Transfer configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Cluster, Commitment, Pubkey};

/// Destination used when no recipient is configured.
pub const DEFAULT_RECIPIENT: &str = "5e1g9YW3XpsXddudcTiu5XdXN6uYstb3fnpJJrRUZ33t";

/// [`DEFAULT_RECIPIENT`] decoded; the two must stay in sync.
pub const DEFAULT_RECIPIENT_KEY: Pubkey = Pubkey::new([
    68, 234, 0, 53, 78, 97, 148, 173, 94, 137, 204, 80, 216, 162, 11, 139, 18, 219, 174, 11, 24,
    27, 234, 52, 245, 71, 149, 189, 185, 66, 71, 95,
]);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Configuration for a transfer session.
///
/// Can be loaded from a TOML file via [`TransferConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferConfig {
    /// Cluster to talk to.
    #[serde(default)]
    pub cluster: Cluster,

    /// Explicit RPC endpoint; overrides the cluster's public endpoint.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Destination of every transfer.
    #[serde(default = "default_recipient")]
    pub recipient: Pubkey,

    /// Commitment a transaction must reach to count as settled.
    #[serde(default)]
    pub commitment: Commitment,

    /// Overall deadline for confirmation; `0` disables it.
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Interval between signature status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_recipient() -> Pubkey {
    DEFAULT_RECIPIENT_KEY
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            rpc_url: None,
            recipient: default_recipient(),
            commitment: Commitment::default(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

impl TransferConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(url) = &self.rpc_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field: "rpc_url",
                    message: format!("'{url}' is not an http(s) URL"),
                });
            }
        }
        if !matches!(self.log_format.as_str(), "human" | "json") {
            return Err(ConfigError::Invalid {
                field: "log_format",
                message: format!("'{}' is not one of human, json", self.log_format),
            });
        }
        Ok(())
    }

    /// Endpoint actually used: explicit URL or the cluster default.
    pub fn rpc_endpoint(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.default_rpc_url())
    }

    pub fn confirm_timeout(&self) -> Option<Duration> {
        (self.confirm_timeout_secs > 0).then(|| Duration::from_secs(self.confirm_timeout_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
