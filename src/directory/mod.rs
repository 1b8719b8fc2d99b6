//! VPN directory access
//!
//! Fetches the region catalog and per-region candidate pools from the
//! NordVPN API, with a fixed retry budget for transient failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use xray_gen::directory::{Capability, DirectoryClient, NordApiClient, DEFAULT_POOL_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DirectoryClient::new(NordApiClient::new()?);
//! for region in client.list_regions()? {
//!     if let Some(endpoint) =
//!         client.find_best_endpoint(&region, Capability::WIREGUARD_UDP, DEFAULT_POOL_SIZE)?
//!     {
//!         println!("{}: {} ({}%)", region.code, endpoint.hostname, endpoint.load);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use api::{DirectoryApi, NordApiClient, NORD_API_URL};
pub use client::{DirectoryClient, DEFAULT_POOL_SIZE};
pub use error::{DirectoryError, Result};
pub use retry::RetryPolicy;
pub use types::{Capability, Endpoint, RawCandidate, Region, WIREGUARD_PORT};
