//! Core configuration types and loading.

use p10_proto::{MAX_USER_NUMERIC, ServerNumeric};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::links::LinkBlock;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Local server identity.
    pub server: ServerConfig,
    /// Link blocks for server peering.
    #[serde(default)]
    pub links: Vec<LinkBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find the link block for a peer by name (case-insensitive).
    pub fn link(&self, name: &str) -> Option<&LinkBlock> {
        self.links
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "hub.example.net").
    pub name: String,
    /// This server's P10 numeric (2 characters).
    pub numeric: ServerNumeric,
    /// Server description.
    #[serde(default)]
    pub description: String,
    /// Size of the local user numeric space (1..=262144).
    #[serde(default = "default_max_clients")]
    pub max_clients: u32,
}

impl ServerConfig {
    /// Highest user numeric this server hands out, as advertised in `SERVER`.
    pub fn capacity_mask(&self) -> u32 {
        self.max_clients.saturating_sub(1).min(MAX_USER_NUMERIC)
    }
}

fn default_max_clients() -> u32 {
    4096
}
