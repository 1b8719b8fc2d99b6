use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::types::{DEFAULT_PORT, RelayProtocol};

#[derive(Parser)]
#[command(name = "xray-gen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate Xray configs routed through NordVPN WireGuard endpoints")]
#[command(long_about = "Picks the least loaded NordVPN WireGuard server for each requested country and generates a matching Xray VLESS config and Docker Compose manifest, with one client per country.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to settings file (defaults to ./.xray-gen.toml, then ~/.xray-gen.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate config.json and docker-compose.yml
    Generate(GenerateArgs),

    /// Fetch your NordLynx private key using a NordVPN access token
    FetchKey {
        /// Access token from the NordVPN dashboard
        #[arg(long, env = "NORD_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the ranked WireGuard candidates for one country
    Candidates {
        /// Country code, e.g. US
        #[arg(value_name = "CODE")]
        region: String,

        /// Number of candidates to request
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// NordVPN WireGuard (NordLynx) private key
    #[arg(long, env = "NORD_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Comma separated country codes, e.g. "US,JP,UK"
    #[arg(long, env = "NORD_COUNTRIES", value_name = "CODES")]
    pub countries: Option<String>,

    /// Port the VLESS inbound listens on
    #[arg(long, env = "XRAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Add a client that egresses directly, without a VPN
    #[arg(long, env = "ENABLE_DIRECT")]
    pub direct: bool,

    /// Run one VPN sidecar container per country instead of in-process WireGuard
    #[arg(long, env = "USE_SIDECARS")]
    pub sidecars: bool,

    /// Relay protocol between Xray and the sidecars
    #[arg(long, env = "SIDECAR_RELAY", value_enum, default_value_t = RelayProtocol::Shadowsocks)]
    pub relay: RelayProtocol,

    /// Pin each sidecar to the least loaded server found now (sidecar mode only)
    #[arg(long, env = "PIN_SIDECAR_HOSTS")]
    pub pin_hosts: bool,

    /// Public domain used in the client links
    #[arg(long, env = "XRAY_DOMAIN")]
    pub domain: Option<String>,

    /// Join this existing Docker network instead of creating one
    #[arg(long, env = "DOCKER_NETWORK")]
    pub network: Option<String>,

    /// Output directory for generated files
    #[arg(short, long, env = "OUTPUT_DIR", value_name = "OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// Print the generated files instead of writing them
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
