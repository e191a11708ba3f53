//! Firewall backends: read and edit the allow-list.
//!
//! The reconciliation engine never talks to a cloud API; it only sees the
//! [`RuleEntry`] values a backend reads and hands back one allow or revoke
//! directive per (CIDR, port) pair. Backends live behind a trait so tests
//! can substitute a mock.

mod ec2;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Command;

pub use ec2::{parse_describe_output, Ec2Backend};

use crate::config::FirewallConfig;
use crate::error::CfsyncError;
use crate::model::{AddressFamily, Rule, RuleEntry};

/// Trait for firewall rule storage.
#[async_trait]
pub trait FirewallBackend: Send + Sync {
    /// Read the current ingress entries.
    async fn describe(&self) -> Result<Vec<RuleEntry>>;

    /// Allow one CIDR/port pair (TCP ingress).
    async fn authorize(&self, family: AddressFamily, rule: &Rule) -> Result<()>;

    /// Revoke one CIDR/port pair (TCP ingress).
    async fn revoke(&self, family: AddressFamily, rule: &Rule) -> Result<()>;
}

/// Create a firewall backend for the configured target.
pub fn create_backend(config: &FirewallConfig) -> Result<Box<dyn FirewallBackend>> {
    if config.security_group_id.is_empty() {
        return Err(CfsyncError::Config(
            "No security group configured. Set firewall.security_group_id \
             in the config file or the CFSYNC_SECURITY_GROUP_ID environment variable."
                .to_string(),
        )
        .into());
    }
    Ok(Box::new(Ec2Backend::new(
        config.security_group_id.clone(),
        config.region.clone(),
    )))
}

/// Execute a command and return its stdout.
pub(crate) fn exec_cmd(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute {}", program))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} failed: {}", program, stderr)
    }
}
