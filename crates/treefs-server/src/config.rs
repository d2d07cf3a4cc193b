// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use treefs_core::FsConfig;

/// Configuration shared by the batch runner and the datagram server.
///
/// ```toml
/// threads = 8
/// queue-capacity = 10
/// recv-timeout-ms = 200
///
/// [fs.limits]
/// max-nodes = 50
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Worker threads applying commands
    pub threads: usize,
    /// Commands buffered ahead of the workers
    pub queue_capacity: usize,
    /// How often datagram workers check for shutdown
    pub recv_timeout_ms: u64,
    pub fs: FsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            queue_capacity: 10,
            recv_timeout_ms: 200,
            fs: FsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid server configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in config file {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.threads > 0, "threads must be at least 1");
        ensure!(self.queue_capacity > 0, "queue-capacity must be at least 1");
        ensure!(self.recv_timeout_ms > 0, "recv-timeout-ms must be at least 1");
        self.fs.validate().context("invalid [fs] limits")?;
        Ok(())
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.threads, 4);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.recv_timeout(), Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            threads = 2

            [fs.limits]
            max-nodes = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.threads, 2);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.fs.limits.max_nodes, 8);
        assert_eq!(config.fs.limits.max_dir_entries, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServerConfig::from_toml_str("threads = 0").is_err());
        assert!(ServerConfig::from_toml_str("queue-capacity = 0").is_err());
        assert!(ServerConfig::from_toml_str("[fs.limits]\nmax-nodes = 0").is_err());
        assert!(ServerConfig::from_toml_str("threads = \"many\"").is_err());
    }
}
