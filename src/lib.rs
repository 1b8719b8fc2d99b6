//! # xray-gen
//!
//! Generates an Xray VLESS-over-XHTTP configuration together with a Docker
//! Compose manifest, egressing each client through the least loaded NordVPN
//! WireGuard server of its country.
//!
//! ## Features
//!
//! - **Directory lookup**: region catalog and server candidates with bounded retries
//! - **Endpoint selection**: capability filtering and pluggable load ranking
//! - **Two tunnel strategies**: in-process WireGuard or one VPN sidecar per region
//! - **Validated output**: both artifacts are assembled and checked before anything is written
//!
//! ## Example
//!
//! ```rust,no_run
//! use xray_gen::config::types::Settings;
//! use xray_gen::directory::{DirectoryClient, NordApiClient};
//! use xray_gen::keygen::CommandKeySource;
//! use xray_gen::orchestrator::Orchestrator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::new("PRIVATE_KEY", vec!["US".to_string(), "JP".to_string()]);
//! let directory = DirectoryClient::new(NordApiClient::new()?);
//! let keys = CommandKeySource::new(settings.keygen_command.clone());
//! let outcome = Orchestrator::new(&settings, &directory, &keys).run()?;
//! println!("{}", outcome.bundle.proxy.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod common;
pub mod config;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod keygen;
pub mod manifest;
pub mod orchestrator;
pub mod proxy;
pub mod selector;

pub use error::{GeneratorError, Result};
use cli::{Cli, Commands};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Generate(args) => handlers::handle_generate(args, config_path),
        Commands::FetchKey { token } => handlers::handle_fetch_key(&token, config_path),
        Commands::Candidates { region, limit } => {
            handlers::handle_candidates(&region, limit, config_path)
        }
    }
}
