//! Configuration management for cfsync.
//!
//! Configuration comes from a YAML file with environment variable overrides
//! (`CFSYNC_SECURITY_GROUP_ID`, `CFSYNC_PORTS`) so the tool works both with
//! an installed config and as a bare scheduled job. A missing file is not an
//! error when the required values arrive via the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::provider::CLOUDFLARE_IPS_URL;
use crate::reconcile::DEFAULT_PORTS;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target firewall (EC2 security group)
    pub firewall: FirewallConfig,

    /// TCP ports the allow-list covers
    pub ports: Vec<u16>,

    /// Endpoint publishing the desired ranges
    pub provider_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FirewallConfig {
    /// Security group ID, e.g. "sg-0123456789abcdef0"
    pub security_group_id: String,

    /// AWS region override; defaults to the ambient CLI configuration
    pub region: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firewall: FirewallConfig::default(),
            ports: DEFAULT_PORTS.to_vec(),
            provider_url: CLOUDFLARE_IPS_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, then overlay environment
    /// variables and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            info!("No config file at {:?}, using defaults + environment", path);
            Self::default()
        };

        config.apply_env();
        config.sanitize_ports();
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables on top of the file values.
    fn apply_env(&mut self) {
        if let Ok(val) = env::var("CFSYNC_SECURITY_GROUP_ID") {
            self.firewall.security_group_id = val;
        }
        if let Ok(val) = env::var("CFSYNC_PORTS") {
            self.ports = parse_ports(&val);
        }
    }

    /// An empty or invalid port list falls back to the default rather than
    /// becoming "allow nothing", which would plan the removal of every rule.
    fn sanitize_ports(&mut self) {
        if self.ports.is_empty() || self.ports.contains(&0) {
            warn!(
                "Invalid port configuration {:?}, using default port {}",
                self.ports, DEFAULT_PORTS[0]
            );
            self.ports = DEFAULT_PORTS.to_vec();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.provider_url.starts_with("https://") {
            anyhow::bail!("Provider URL must use HTTPS: {}", self.provider_url);
        }
        Ok(())
    }
}

/// Parse a comma-separated port list (e.g. "80,443").
///
/// Any unparseable or out-of-range entry invalidates the whole list and
/// falls back to the default, matching the config-file behavior.
pub fn parse_ports(value: &str) -> Vec<u16> {
    let parsed: Option<Vec<u16>> = value
        .split(',')
        .map(|p| p.trim().parse::<u16>().ok().filter(|&port| port > 0))
        .collect();

    match parsed {
        Some(ports) if !ports.is_empty() => ports,
        _ => {
            warn!(
                "Invalid port list {:?}, using default port {}",
                value, DEFAULT_PORTS[0]
            );
            DEFAULT_PORTS.to_vec()
        }
    }
}
