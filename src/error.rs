//! Error types for cfsync.
//!
//! Boundary failures are classified so the caller can tell an upstream data
//! problem from a firewall one. A provider or firewall-read failure aborts
//! the run before any reconciliation happens: an unreadable snapshot is
//! never treated as an empty one.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfsyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider data error: {0}")]
    Provider(String),

    #[error("Firewall read error: {0}")]
    FirewallRead(String),

    #[error("Firewall update error: {0}")]
    Firewall(String),
}
