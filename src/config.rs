//! Process configuration read from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ServerError;

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_INTERPRETER: &str = "/run/current-system/profile/bin/bash";
pub const PRIMARY_BRANCH: &str = "master";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Shell used to run every deploy script
    pub interpreter: PathBuf,
    /// The only branch whose pushes trigger a deploy
    pub primary_branch: String,
    /// `None` means a deploy may run forever
    pub deploy_timeout: Option<Duration>,
    pub serialize_deploys: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            primary_branch: PRIMARY_BRANCH.to_string(),
            deploy_timeout: None,
            serialize_deploys: false,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Build the config from the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = port.trim().parse().map_err(|e| {
                ServerError::ConfigError(format!("Invalid PORT '{}': {}", port, e))
            })?;
        }

        if let Some(secs) = get("DEPLOY_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                ServerError::ConfigError(format!("Invalid DEPLOY_TIMEOUT_SECS '{}': {}", secs, e))
            })?;
            config.deploy_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(flag) = get("SERIALIZE_DEPLOYS") {
            config.serialize_deploys = parse_flag(&flag).ok_or_else(|| {
                ServerError::ConfigError(format!("Invalid SERIALIZE_DEPLOYS '{}'", flag))
            })?;
        }

        config.log_dir = get("LOG_DIR").map(PathBuf::from);

        Ok(config)
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
