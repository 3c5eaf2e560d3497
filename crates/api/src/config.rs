//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use pathguard_observability::LogFormat;

pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8090";
pub const DEFAULT_USERINFO_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Route prefix for protected endpoints; also stripped from the request
    /// target before policy evaluation. Empty, or `/segment[/segment...]`.
    pub api_prefix: String,
    pub userinfo_endpoint: String,
    pub policy_store_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub userinfo_timeout: Duration,
    pub log_format: LogFormat,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_prefix = lookup("API_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
        validate_prefix(&api_prefix)?;

        let userinfo_endpoint = lookup("AUTH_SERVER_USERINFO_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("AUTH_SERVER_USERINFO_ENDPOINT"))?;

        let policy_store_path = lookup("POLICY_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let timeout_secs = match lookup("USERINFO_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "USERINFO_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_USERINFO_TIMEOUT_SECS,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(v) => v.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                var: "LOG_FORMAT",
                reason: e.to_string(),
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            api_prefix,
            userinfo_endpoint,
            policy_store_path,
            bind_addr,
            userinfo_timeout: Duration::from_secs(timeout_secs),
            log_format,
        })
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Ok(());
    }
    let invalid = |reason: &str| ConfigError::Invalid {
        var: "API_PREFIX",
        reason: reason.to_string(),
    };
    if !prefix.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if prefix.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }
    if prefix.contains(['?', '#', ' ']) {
        return Err(invalid("must be a plain path"));
    }
    Ok(())
}
