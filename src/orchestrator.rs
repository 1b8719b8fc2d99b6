//! One generation run
//!
//! Loads the region catalog, walks the requested regions in directory order
//! and feeds the proxy and manifest builders from that single pass. Nothing
//! is written here; the caller receives a finalized [`ConfigBundle`] or an
//! error, never a partial result.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::types::{RelayProtocol, Settings, TunnelStrategy};
use crate::directory::{
    Capability, DirectoryApi, DirectoryClient, DirectoryError, Endpoint, Region,
};
use crate::error::{GeneratorError, Result};
use crate::keygen::{KeyPair, KeySource, resolve_key_pair};
use crate::manifest::{ComposeBuilder, DeploymentManifest, LocationHint};
use crate::proxy::{
    DIRECT_TAG, Flow, InboundSettings, OutboundKind, ProxyConfig, ProxyConfigBuilder, SocksAuth,
    WireGuardSettings,
};
use crate::selector::RankingPolicy;

/// Interface address used by every WireGuard outbound
pub const WIREGUARD_INTERFACE_ADDRESS: &str = "10.5.0.2/32";

/// Label of the optional non-tunneled client
pub const DIRECT_LABEL: &str = "direct.user@example.com";

/// Destinations the direct client may never reach
pub const PRIVATE_IP_RANGES: &[&str] = &[
    "geoip:private",
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "fc00::/7",
    "fe80::/10",
    "::1/128",
];
pub const PRIVATE_DOMAINS: &[&str] = &["localhost", "domain:local", "domain:internal", "domain:lan"];

/// Both generated artifacts, validated together
#[derive(Debug, Clone)]
pub struct ConfigBundle {
    pub proxy: ProxyConfig,
    pub manifest: DeploymentManifest,
}

#[derive(Debug, Clone)]
pub struct ProcessedRegion {
    pub region: Region,
    pub label: String,
    pub tag: String,
    /// Server chosen at generation time; `None` for unpinned sidecars
    pub endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The directory answered but no candidate qualified
    NoEndpoint,
    /// The directory could not be reached within the retry budget
    Unavailable(String),
    /// The directory answered with something unusable (bad payload, rejected credentials)
    Failed(String),
}

impl SkipReason {
    fn from_lookup_error(error: &DirectoryError) -> Self {
        match error {
            DirectoryError::Unavailable { .. } => SkipReason::Unavailable(error.to_string()),
            _ => SkipReason::Failed(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedRegion {
    pub region: Region,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub bundle: ConfigBundle,
    pub key_pair: KeyPair,
    pub processed: Vec<ProcessedRegion>,
    pub skipped: Vec<SkippedRegion>,
}

impl GenerationOutcome {
    /// True when no region produced a usable tunnel
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

/// Client label for a region
pub fn region_label(region: &Region) -> String {
    format!("{}.user@example.com", region.code.to_lowercase())
}

/// Outbound tag for a region
pub fn region_tag(region: &Region) -> String {
    format!("nordvpn-{}", region.code.to_lowercase())
}

/// Compose service name of a region's sidecar
pub fn sidecar_name(region: &Region) -> String {
    format!("nord-{}", region.code.to_lowercase())
}

/// Regions from the catalog whose code was requested, in catalog order
pub fn filter_regions(catalog: Vec<Region>, wanted: &[String]) -> Vec<Region> {
    catalog
        .into_iter()
        .filter(|r| wanted.iter().any(|code| r.matches_code(code)))
        .collect()
}

/// Flow usable with `key_pair`.
///
/// Vision needs TLS, REALITY or VLESS encryption underneath; the XHTTP
/// inbound has no TLS of its own, so the fallback pair forces plain clients.
pub fn effective_flow(configured: Flow, key_pair: &KeyPair) -> Flow {
    if configured == Flow::Vision && key_pair.is_fallback() {
        log::warn!(
            "VLESS encryption is off; using flow 'none' instead of '{}'",
            Flow::Vision.as_str()
        );
        return Flow::Plain;
    }
    configured
}

/// Fresh relay password for one sidecar
pub fn generate_shared_secret() -> String {
    STANDARD.encode(rand::random::<[u8; 24]>())
}

pub struct Orchestrator<'a, A, P> {
    settings: &'a Settings,
    directory: &'a DirectoryClient<A, P>,
    keys: &'a dyn KeySource,
}

impl<'a, A: DirectoryApi, P: RankingPolicy> Orchestrator<'a, A, P> {
    pub fn new(
        settings: &'a Settings,
        directory: &'a DirectoryClient<A, P>,
        keys: &'a dyn KeySource,
    ) -> Self {
        Self {
            settings,
            directory,
            keys,
        }
    }

    pub fn run(&self) -> Result<GenerationOutcome> {
        let settings = self.settings;

        let catalog = self.directory.list_regions()?;
        log::info!("Directory lists {} regions", catalog.len());
        let regions = filter_regions(catalog, &settings.region_codes);
        if regions.is_empty() {
            return Err(GeneratorError::NoMatchingRegions {
                requested: settings.region_codes.join(","),
            });
        }
        log::info!(
            "Generating configuration for {} regions ({:?} strategy)",
            regions.len(),
            settings.strategy
        );

        let key_pair = resolve_key_pair(self.keys);
        let flow = effective_flow(settings.flow, &key_pair);

        let mut proxy = ProxyConfigBuilder::new(InboundSettings {
            port: settings.listen_port,
            decryption: key_pair.decryption.clone(),
        })
        .log_level(settings.log_level.clone());
        let mut compose = ComposeBuilder::new(settings.manifest_settings());

        let mut processed = Vec::new();
        let mut skipped = Vec::new();

        for region in regions {
            let step = match settings.strategy {
                TunnelStrategy::Direct => self.add_direct_region(&region, flow, &mut proxy)?,
                TunnelStrategy::Sidecar => {
                    Ok(self.add_sidecar_region(&region, flow, &mut proxy, &mut compose)?)
                }
            };
            match step {
                Ok(done) => processed.push(done),
                Err(reason) => {
                    match &reason {
                        SkipReason::NoEndpoint => log::warn!(
                            "{} ({}): no WireGuard server found, skipping",
                            region.name,
                            region.code
                        ),
                        SkipReason::Unavailable(e) => log::warn!(
                            "{} ({}): directory unavailable, skipping: {}",
                            region.name,
                            region.code,
                            e
                        ),
                        SkipReason::Failed(e) => log::warn!(
                            "{} ({}): server lookup failed, skipping: {}",
                            region.name,
                            region.code,
                            e
                        ),
                    }
                    skipped.push(SkippedRegion { region, reason });
                }
            }
        }

        if settings.enable_direct {
            proxy.add_client(DIRECT_LABEL, flow)?;
            // Must precede the allow route: the block rules are inserted at the front
            proxy.add_blocking_rule(DIRECT_LABEL, PRIVATE_IP_RANGES, PRIVATE_DOMAINS);
            proxy.add_route(DIRECT_LABEL, DIRECT_TAG);
        }

        compose.add_main_service(settings.listen_port)?;

        let bundle = ConfigBundle {
            proxy: proxy.finalize()?,
            manifest: compose.finalize()?,
        };

        if processed.is_empty() {
            log::warn!("No region produced a tunnel; the config only has the default outbounds");
        }

        Ok(GenerationOutcome {
            bundle,
            key_pair,
            processed,
            skipped,
        })
    }

    /// Outer `Err` aborts the run; inner `Err` skips the region
    fn add_direct_region(
        &self,
        region: &Region,
        flow: Flow,
        proxy: &mut ProxyConfigBuilder,
    ) -> Result<std::result::Result<ProcessedRegion, SkipReason>> {
        let endpoint = match self.directory.find_best_endpoint(
            region,
            Capability::WIREGUARD_UDP,
            self.settings.directory.pool_size,
        ) {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => return Ok(Err(SkipReason::NoEndpoint)),
            Err(e) => return Ok(Err(SkipReason::from_lookup_error(&e))),
        };
        log::info!(
            "{} ({}): {} at {}% load",
            region.name,
            region.code,
            endpoint.hostname,
            endpoint.load
        );

        let label = region_label(region);
        let tag = region_tag(region);

        proxy.add_client(label.clone(), flow)?;
        proxy.add_tunnel(
            tag.clone(),
            OutboundKind::WireGuard(WireGuardSettings {
                secret_key: self.settings.private_key.clone(),
                addresses: vec![WIREGUARD_INTERFACE_ADDRESS.to_string()],
                peer_public_key: endpoint.public_key.clone(),
                peer_endpoint: endpoint.socket(),
            }),
        )?;
        proxy.add_route(&label, &tag);

        Ok(Ok(ProcessedRegion {
            region: region.clone(),
            label,
            tag,
            endpoint: Some(endpoint),
        }))
    }

    fn add_sidecar_region(
        &self,
        region: &Region,
        flow: Flow,
        proxy: &mut ProxyConfigBuilder,
        compose: &mut ComposeBuilder,
    ) -> Result<ProcessedRegion> {
        let settings = self.settings;
        let service = sidecar_name(region);
        let secret = generate_shared_secret();

        let endpoint = if settings.pin_sidecar_hosts {
            self.pinned_endpoint(region)
        } else {
            None
        };
        let hint = match &endpoint {
            Some(endpoint) => LocationHint::Host(endpoint.hostname.clone()),
            None => LocationHint::Region(region.name.clone()),
        };

        compose.add_tunnel_service(&service, &secret, hint, Some(&settings.private_key))?;

        let label = region_label(region);
        let tag = region_tag(region);
        let port = settings.relay.port();
        let kind = match settings.relay {
            RelayProtocol::Shadowsocks => OutboundKind::Shadowsocks {
                address: service.clone(),
                port,
                method: RelayProtocol::SHADOWSOCKS_CIPHER.to_string(),
                password: secret,
            },
            RelayProtocol::Socks => OutboundKind::Socks {
                address: service.clone(),
                port,
                auth: Some(SocksAuth {
                    user: RelayProtocol::SOCKS_USER.to_string(),
                    pass: secret,
                }),
            },
        };

        proxy.add_client(label.clone(), flow)?;
        proxy.add_tunnel(tag.clone(), kind)?;
        proxy.add_route(&label, &tag);
        log::info!("{} ({}): relayed through sidecar '{}'", region.name, region.code, service);

        Ok(ProcessedRegion {
            region: region.clone(),
            label,
            tag,
            endpoint,
        })
    }

    /// Best server for pinning a sidecar; lookup problems fall back to the region hint
    fn pinned_endpoint(&self, region: &Region) -> Option<Endpoint> {
        match self.directory.find_best_endpoint(
            region,
            Capability::WIREGUARD_UDP,
            self.settings.directory.pool_size,
        ) {
            Ok(found) => found,
            Err(e) => {
                log::warn!(
                    "{}: could not pin a server ({}), letting the sidecar choose",
                    region.code,
                    e
                );
                None
            }
        }
    }
}
