//! Docker Compose manifest assembly
//!
//! The manifest mirrors the tunnel topology of the proxy config: one sidecar
//! service per relayed region and the Xray service depending on all of them.

pub mod builder;
pub mod types;

use thiserror::Error;

pub use builder::{
    ComposeBuilder, LocationHint, MAIN_SERVICE, ManifestSettings, supports_socks_relay,
};
pub use types::{DeploymentManifest, NetworkSpec, ServiceNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("service '{0}' is already declared")]
    DuplicateService(String),

    #[error("service '{service}' depends on undeclared service '{dependency}'")]
    MissingDependency { service: String, dependency: String },

    #[error("dependency cycle through service '{0}'")]
    Cycle(String),

    #[error("sidecar image '{image}' has no SOCKS server; use the shadowsocks relay or another image")]
    UnsupportedRelay { image: String },

    #[error("the main '{}' service was never declared", MAIN_SERVICE)]
    MissingMainService,
}
