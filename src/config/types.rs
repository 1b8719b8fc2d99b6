use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::directory::{DEFAULT_POOL_SIZE, NORD_API_URL, RetryPolicy};
use crate::manifest::ManifestSettings;
use crate::manifest::builder::{DEFAULT_SIDECAR_IMAGE, DEFAULT_XRAY_IMAGE};
use crate::proxy::{DOMAIN_PLACEHOLDER, Flow};
use crate::proxy::builder::DEFAULT_LOG_LEVEL;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_OUTPUT_DIR: &str = "config";
pub const DEFAULT_KEYGEN_COMMAND: &str = "xray vlessenc";

/// How traffic reaches each region's VPN server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TunnelStrategy {
    /// Xray dials WireGuard itself
    #[default]
    Direct,
    /// A VPN sidecar container per region, reached over a local relay
    Sidecar,
}

/// Relay protocol between Xray and a sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RelayProtocol {
    #[default]
    Shadowsocks,
    Socks,
}

impl RelayProtocol {
    pub const SHADOWSOCKS_CIPHER: &'static str = "chacha20-ietf-poly1305";
    pub const SOCKS_USER: &'static str = "xray";

    pub fn port(&self) -> u16 {
        match self {
            RelayProtocol::Shadowsocks => 8388,
            RelayProtocol::Socks => 1080,
        }
    }
}

/// Optional settings file (`.xray-gen.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: DirectoryConfig,
    pub images: ImagesConfig,
    pub output: OutputConfig,
    pub keygen: KeygenConfig,
    /// VLESS flow for every client ("xtls-rprx-vision" or "none")
    pub flow: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub api_url: Option<String>,
    pub pool_size: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub xray: Option<String>,
    pub sidecar: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    /// Command line printing the VLESS key pair
    pub command: Option<String>,
}

/// Directory access tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySettings {
    pub api_url: String,
    pub pool_size: usize,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            api_url: NORD_API_URL.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything one generation run needs, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub private_key: String,
    /// Upper-cased region codes in the order given
    pub region_codes: Vec<String>,
    pub listen_port: u16,
    pub enable_direct: bool,
    pub strategy: TunnelStrategy,
    pub relay: RelayProtocol,
    /// Pin each sidecar to the least loaded server found at generation time
    pub pin_sidecar_hosts: bool,
    pub public_domain: String,
    pub network_name: Option<String>,
    pub flow: Flow,
    pub log_level: String,
    pub directory: DirectorySettings,
    pub xray_image: String,
    pub sidecar_image: String,
    pub keygen_command: Vec<String>,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Defaults for everything but the two required inputs
    pub fn new(private_key: impl Into<String>, region_codes: Vec<String>) -> Self {
        Self {
            private_key: private_key.into(),
            region_codes,
            listen_port: DEFAULT_PORT,
            enable_direct: false,
            strategy: TunnelStrategy::Direct,
            relay: RelayProtocol::Shadowsocks,
            pin_sidecar_hosts: false,
            public_domain: DOMAIN_PLACEHOLDER.to_string(),
            network_name: None,
            flow: Flow::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            directory: DirectorySettings::default(),
            xray_image: DEFAULT_XRAY_IMAGE.to_string(),
            sidecar_image: DEFAULT_SIDECAR_IMAGE.to_string(),
            keygen_command: split_command(DEFAULT_KEYGEN_COMMAND),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn manifest_settings(&self) -> ManifestSettings {
        ManifestSettings {
            xray_image: self.xray_image.clone(),
            sidecar_image: self.sidecar_image.clone(),
            relay: self.relay,
            network_name: self.network_name.clone(),
            ..ManifestSettings::default()
        }
    }
}

pub(crate) fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
