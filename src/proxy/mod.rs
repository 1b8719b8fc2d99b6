//! Xray config assembly
//!
//! [`ProxyConfigBuilder`] owns the growing set of VLESS clients, outbound
//! tunnels and routing rules. Rules are first-match-wins, so blocking rules
//! are always kept ahead of the per-client routes they could be shadowed by.

pub mod builder;
pub mod link;
pub mod types;

use thiserror::Error;

pub use builder::{BLOCKED_TAG, DIRECT_TAG, DOMESTIC_BLOCKLIST, ProxyConfigBuilder};
pub use link::{DOMAIN_PLACEHOLDER, client_link};
pub use types::{
    ClientIdentity, Flow, InboundSettings, OutboundKind, OutboundTunnel, ProxyConfig, RoutingRule,
    SocksAuth, WireGuardSettings,
};

/// Broken cross references between config objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("client label '{0}' is already registered")]
    DuplicateClient(String),

    #[error("outbound tag '{0}' is already registered")]
    DuplicateTunnel(String),

    #[error("routing rule #{index} references undeclared outbound '{tag}'")]
    UnknownOutbound { tag: String, index: usize },

    #[error("routing rule #{index} references unknown client '{label}'")]
    UnknownClient { label: String, index: usize },
}
