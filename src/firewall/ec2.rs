//! EC2 security group backend.
//!
//! Drives the `aws` CLI rather than linking a cloud SDK: `describe-security-groups`
//! to read the current ingress entries, `authorize-security-group-ingress` /
//! `revoke-security-group-ingress` to edit them. Only single-port TCP
//! permissions are surfaced to the engine; every other permission in the
//! group is left untouched.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{exec_cmd, FirewallBackend};
use crate::error::CfsyncError;
use crate::model::{AddressFamily, Rule, RuleEntry};

/// Firewall backend targeting one EC2 security group.
pub struct Ec2Backend {
    group_id: String,
    region: Option<String>,
}

#[derive(Deserialize)]
struct DescribeOutput {
    #[serde(rename = "SecurityGroups", default)]
    security_groups: Vec<SecurityGroup>,
}

#[derive(Deserialize)]
struct SecurityGroup {
    #[serde(rename = "IpPermissions", default)]
    ip_permissions: Vec<IpPermission>,
}

#[derive(Deserialize)]
struct IpPermission {
    #[serde(rename = "IpProtocol", default)]
    ip_protocol: String,
    #[serde(rename = "FromPort")]
    from_port: Option<u16>,
    #[serde(rename = "ToPort")]
    to_port: Option<u16>,
    #[serde(rename = "IpRanges", default)]
    ip_ranges: Vec<IpRange>,
    #[serde(rename = "Ipv6Ranges", default)]
    ipv6_ranges: Vec<Ipv6Range>,
}

#[derive(Deserialize)]
struct IpRange {
    #[serde(rename = "CidrIp")]
    cidr_ip: String,
}

#[derive(Deserialize)]
struct Ipv6Range {
    #[serde(rename = "CidrIpv6")]
    cidr_ipv6: String,
}

impl Ec2Backend {
    pub fn new(group_id: String, region: Option<String>) -> Self {
        Self { group_id, region }
    }

    fn run_aws(&self, args: &[&str]) -> Result<String> {
        let mut full_args: Vec<&str> = Vec::new();
        if let Some(ref region) = self.region {
            full_args.extend(["--region", region.as_str()]);
        }
        full_args.extend(args);
        full_args.extend(["--output", "json"]);
        exec_cmd("aws", &full_args)
    }

    /// Build the `--ip-permissions` payload for one rule. IPv4 and IPv6 use
    /// different range fields but otherwise the exact same shape.
    fn ip_permission(family: AddressFamily, rule: &Rule) -> serde_json::Value {
        let mut permission = json!({
            "IpProtocol": "tcp",
            "FromPort": rule.port,
            "ToPort": rule.port,
        });
        match family {
            AddressFamily::V4 => {
                permission["IpRanges"] = json!([{ "CidrIp": rule.cidr }]);
            }
            AddressFamily::V6 => {
                permission["Ipv6Ranges"] = json!([{ "CidrIpv6": rule.cidr }]);
            }
        }
        json!([permission])
    }
}

#[async_trait]
impl FirewallBackend for Ec2Backend {
    async fn describe(&self) -> Result<Vec<RuleEntry>> {
        let output = self
            .run_aws(&[
                "ec2",
                "describe-security-groups",
                "--group-ids",
                &self.group_id,
            ])
            .map_err(|e| CfsyncError::FirewallRead(format!("{:#}", e)))?;

        let entries = parse_describe_output(&output)?;
        info!(
            "Read security group {} ({} single-port TCP entries)",
            self.group_id,
            entries.len()
        );
        Ok(entries)
    }

    async fn authorize(&self, family: AddressFamily, rule: &Rule) -> Result<()> {
        let permissions = Self::ip_permission(family, rule).to_string();
        self.run_aws(&[
            "ec2",
            "authorize-security-group-ingress",
            "--group-id",
            &self.group_id,
            "--ip-permissions",
            &permissions,
        ])
        .map_err(|e| CfsyncError::Firewall(format!("authorize {}: {:#}", rule, e)))?;
        debug!("Authorized {} ({})", rule, family);
        Ok(())
    }

    async fn revoke(&self, family: AddressFamily, rule: &Rule) -> Result<()> {
        let permissions = Self::ip_permission(family, rule).to_string();
        self.run_aws(&[
            "ec2",
            "revoke-security-group-ingress",
            "--group-id",
            &self.group_id,
            "--ip-permissions",
            &permissions,
        ])
        .map_err(|e| CfsyncError::Firewall(format!("revoke {}: {:#}", rule, e)))?;
        debug!("Revoked {} ({})", rule, family);
        Ok(())
    }
}

/// Parse `describe-security-groups` JSON into rule entries.
///
/// Permissions that are not TCP or span a port range are skipped, not
/// errors: the group may legitimately carry rules this tool does not manage.
pub fn parse_describe_output(content: &str) -> Result<Vec<RuleEntry>> {
    let output: DescribeOutput = serde_json::from_str(content)
        .map_err(|e| CfsyncError::FirewallRead(format!("invalid describe output: {}", e)))?;

    let group = output
        .security_groups
        .into_iter()
        .next()
        .ok_or_else(|| CfsyncError::FirewallRead("security group not found".to_string()))?;

    let mut entries = Vec::new();
    for permission in group.ip_permissions {
        let (Some(from), Some(to)) = (permission.from_port, permission.to_port) else {
            debug!("Skipping {} permission without ports", permission.ip_protocol);
            continue;
        };
        if permission.ip_protocol != "tcp" || from != to {
            debug!(
                "Skipping unmanaged permission ({} {}-{})",
                permission.ip_protocol, from, to
            );
            continue;
        }
        entries.push(RuleEntry {
            port: from,
            ipv4_ranges: permission.ip_ranges.into_iter().map(|r| r.cidr_ip).collect(),
            ipv6_ranges: permission
                .ipv6_ranges
                .into_iter()
                .map(|r| r.cidr_ipv6)
                .collect(),
        });
    }
    Ok(entries)
}
