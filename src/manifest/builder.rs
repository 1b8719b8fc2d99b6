use std::collections::{BTreeMap, BTreeSet};

use super::ManifestError;
use super::types::{DeploymentManifest, NetworkSpec, ServiceNode};
use crate::config::types::RelayProtocol;

/// Name of the Xray service
pub const MAIN_SERVICE: &str = "xray";
/// Bridge network created when no external network is configured
pub const DEFAULT_NETWORK: &str = "xray-net";
/// Where the generated config is mounted inside the Xray container
pub const CONTAINER_CONFIG_PATH: &str = "/etc/xray/config.json";

pub const DEFAULT_XRAY_IMAGE: &str = "teddysun/xray:latest";
pub const DEFAULT_SIDECAR_IMAGE: &str = "qmcgaw/gluetun:latest";

/// Whether `image` can serve the SOCKS relay.
///
/// gluetun only offers Shadowsocks and an HTTP proxy. Other images are trusted
/// to honour `SOCKS_LISTEN`, `SOCKS_USER` and `SOCKS_PASS`.
pub fn supports_socks_relay(image: &str) -> bool {
    let name = image.split('@').next().unwrap_or(image);
    let repository = name.rsplit('/').next().unwrap_or(name);
    let repository = repository.split(':').next().unwrap_or(repository);
    repository != "gluetun"
}

/// How a sidecar picks its upstream server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationHint {
    /// Let the sidecar choose within a country (display name)
    Region(String),
    /// Pin a specific server hostname
    Host(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSettings {
    pub xray_image: String,
    pub sidecar_image: String,
    pub relay: RelayProtocol,
    /// `Some` joins an existing external network instead of creating one
    pub network_name: Option<String>,
    /// Host path of the config file, relative to the manifest
    pub config_source: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            xray_image: DEFAULT_XRAY_IMAGE.to_string(),
            sidecar_image: DEFAULT_SIDECAR_IMAGE.to_string(),
            relay: RelayProtocol::default(),
            network_name: None,
            config_source: "./config.json".to_string(),
        }
    }
}

/// Accumulates compose services mirroring the chosen tunnel topology
#[derive(Debug)]
pub struct ComposeBuilder {
    settings: ManifestSettings,
    network: NetworkSpec,
    services: BTreeMap<String, ServiceNode>,
    tunnel_services: BTreeSet<String>,
}

impl ComposeBuilder {
    pub fn new(settings: ManifestSettings) -> Self {
        let network = match &settings.network_name {
            Some(name) => NetworkSpec::External(name.clone()),
            None => NetworkSpec::Bridge(DEFAULT_NETWORK.to_string()),
        };
        Self {
            settings,
            network,
            services: BTreeMap::new(),
            tunnel_services: BTreeSet::new(),
        }
    }

    fn insert(&mut self, service: ServiceNode) -> Result<(), ManifestError> {
        if self.services.contains_key(&service.name) {
            return Err(ManifestError::DuplicateService(service.name));
        }
        self.services.insert(service.name.clone(), service);
        Ok(())
    }

    /// Declare a VPN sidecar reached over the configured relay protocol.
    ///
    /// `secret` authenticates the relay; `credential` is the WireGuard private
    /// key the sidecar connects with.
    pub fn add_tunnel_service(
        &mut self,
        name: &str,
        secret: &str,
        hint: LocationHint,
        credential: Option<&str>,
    ) -> Result<(), ManifestError> {
        if self.settings.relay == RelayProtocol::Socks
            && !supports_socks_relay(&self.settings.sidecar_image)
        {
            return Err(ManifestError::UnsupportedRelay {
                image: self.settings.sidecar_image.clone(),
            });
        }

        let mut service = ServiceNode::new(name, &self.settings.sidecar_image, self.network.name());
        service.cap_add.push("NET_ADMIN".to_string());
        service.devices.push("/dev/net/tun:/dev/net/tun".to_string());

        let env = &mut service.environment;
        env.insert("VPN_SERVICE_PROVIDER".into(), "nordvpn".into());
        env.insert("VPN_TYPE".into(), "wireguard".into());
        if let Some(key) = credential {
            env.insert("WIREGUARD_PRIVATE_KEY".into(), key.to_string());
        }
        match hint {
            LocationHint::Region(country) => env.insert("SERVER_COUNTRIES".into(), country),
            LocationHint::Host(host) => env.insert("SERVER_HOSTNAMES".into(), host),
        };

        let port = self.settings.relay.port();
        match self.settings.relay {
            RelayProtocol::Shadowsocks => {
                env.insert("SHADOWSOCKS".into(), "on".into());
                env.insert("SHADOWSOCKS_LISTENING_ADDRESS".into(), format!(":{port}"));
                env.insert("SHADOWSOCKS_CIPHER".into(), RelayProtocol::SHADOWSOCKS_CIPHER.into());
                env.insert("SHADOWSOCKS_PASSWORD".into(), secret.to_string());
            }
            RelayProtocol::Socks => {
                env.insert("SOCKS_LISTEN".into(), format!(":{port}"));
                env.insert("SOCKS_USER".into(), RelayProtocol::SOCKS_USER.into());
                env.insert("SOCKS_PASS".into(), secret.to_string());
            }
        }

        self.insert(service)?;
        self.tunnel_services.insert(name.to_string());
        Ok(())
    }

    /// Declare the Xray service; it depends on every tunnel service added so far
    pub fn add_main_service(&mut self, port: u16) -> Result<(), ManifestError> {
        let mut service =
            ServiceNode::new(MAIN_SERVICE, &self.settings.xray_image, self.network.name());
        service.ports.push(format!("{port}:{port}"));
        service.volumes.push(format!(
            "{}:{}:ro",
            self.settings.config_source, CONTAINER_CONFIG_PATH
        ));
        service.depends_on = self.tunnel_services.clone();
        self.insert(service)
    }

    pub fn finalize(self) -> Result<DeploymentManifest, ManifestError> {
        if !self.services.contains_key(MAIN_SERVICE) {
            return Err(ManifestError::MissingMainService);
        }

        for service in self.services.values() {
            if let Some(missing) = service
                .depends_on
                .iter()
                .find(|d| !self.services.contains_key(*d))
            {
                return Err(ManifestError::MissingDependency {
                    service: service.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        if let Some(service) = find_cycle(&self.services) {
            return Err(ManifestError::Cycle(service));
        }

        Ok(DeploymentManifest {
            services: self.services,
            networks: self.network,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// A service on a dependency cycle, if there is one
fn find_cycle(services: &BTreeMap<String, ServiceNode>) -> Option<String> {
    fn visit<'a>(
        name: &'a str,
        services: &'a BTreeMap<String, ServiceNode>,
        marks: &mut BTreeMap<&'a str, Mark>,
    ) -> Option<String> {
        match marks.get(name) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => return Some(name.to_string()),
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        if let Some(service) = services.get(name) {
            for dependency in &service.depends_on {
                if let Some(on_cycle) = visit(dependency, services, marks) {
                    return Some(on_cycle);
                }
            }
        }
        marks.insert(name, Mark::Done);
        None
    }

    let mut marks = BTreeMap::new();
    services
        .keys()
        .find_map(|name| visit(name, services, &mut marks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ComposeBuilder {
        ComposeBuilder::new(ManifestSettings::default())
    }

    #[test]
    fn test_main_depends_on_all_tunnels() {
        let mut b = builder();
        b.add_tunnel_service("nord-us", "s1", LocationHint::Region("United States".into()), Some("PK"))
            .unwrap();
        b.add_tunnel_service("nord-jp", "s2", LocationHint::Region("Japan".into()), Some("PK"))
            .unwrap();
        b.add_main_service(10000).unwrap();
        let manifest = b.finalize().unwrap();

        let main = manifest.service(MAIN_SERVICE).unwrap();
        let deps: Vec<&str> = main.depends_on.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["nord-jp", "nord-us"]);
        assert_eq!(main.ports, vec!["10000:10000"]);
        assert_eq!(main.volumes, vec!["./config.json:/etc/xray/config.json:ro"]);
    }

    #[test]
    fn test_sidecar_environment() {
        let mut b = builder();
        b.add_tunnel_service("nord-de", "secret", LocationHint::Host("de1.nordvpn.com".into()), None)
            .unwrap();
        b.add_main_service(10000).unwrap();
        let manifest = b.finalize().unwrap();
        let sidecar = manifest.service("nord-de").unwrap();

        assert_eq!(sidecar.environment["SERVER_HOSTNAMES"], "de1.nordvpn.com");
        assert_eq!(sidecar.environment["SHADOWSOCKS_PASSWORD"], "secret");
        assert!(!sidecar.environment.contains_key("WIREGUARD_PRIVATE_KEY"));
        assert!(!sidecar.environment.contains_key("SERVER_COUNTRIES"));
        assert_eq!(sidecar.cap_add, vec!["NET_ADMIN"]);
    }

    #[test]
    fn test_socks_relay_rejected_on_gluetun() {
        let mut b = ComposeBuilder::new(ManifestSettings {
            relay: RelayProtocol::Socks,
            ..Default::default()
        });
        assert_eq!(
            b.add_tunnel_service("nord-fr", "pw", LocationHint::Region("France".into()), None),
            Err(ManifestError::UnsupportedRelay {
                image: DEFAULT_SIDECAR_IMAGE.to_string()
            })
        );
    }

    #[test]
    fn test_socks_capable_images() {
        assert!(!supports_socks_relay("qmcgaw/gluetun"));
        assert!(!supports_socks_relay("qmcgaw/gluetun:v3.40"));
        assert!(!supports_socks_relay("ghcr.io/qdm12/gluetun@sha256:abc"));
        assert!(supports_socks_relay("ghcr.io/example/wg-socks:1"));
        assert!(supports_socks_relay("localhost:5000/nordlynx-socks"));
    }

    #[test]
    fn test_socks_sidecar_environment() {
        let mut b = ComposeBuilder::new(ManifestSettings {
            relay: RelayProtocol::Socks,
            sidecar_image: "ghcr.io/example/wg-socks:1".to_string(),
            ..Default::default()
        });
        b.add_tunnel_service("nord-fr", "pw", LocationHint::Region("France".into()), Some("PK"))
            .unwrap();
        b.add_main_service(10000).unwrap();
        let manifest = b.finalize().unwrap();
        let sidecar = manifest.service("nord-fr").unwrap();
        assert_eq!(sidecar.environment["SOCKS_PASS"], "pw");
        assert_eq!(sidecar.environment["SOCKS_LISTEN"], ":1080");
        assert!(!sidecar.environment.contains_key("SHADOWSOCKS"));
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let mut b = builder();
        b.add_tunnel_service("nord-us", "a", LocationHint::Region("US".into()), None)
            .unwrap();
        assert_eq!(
            b.add_tunnel_service("nord-us", "b", LocationHint::Region("US".into()), None),
            Err(ManifestError::DuplicateService("nord-us".to_string()))
        );
    }

    #[test]
    fn test_missing_main_service() {
        assert_eq!(builder().finalize(), Err(ManifestError::MissingMainService));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut b = builder();
        b.add_main_service(10000).unwrap();
        b.services
            .get_mut(MAIN_SERVICE)
            .unwrap()
            .depends_on
            .insert("ghost".to_string());
        assert_eq!(
            b.finalize(),
            Err(ManifestError::MissingDependency {
                service: MAIN_SERVICE.to_string(),
                dependency: "ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let mut b = builder();
        b.add_tunnel_service("nord-us", "a", LocationHint::Region("US".into()), None)
            .unwrap();
        b.add_main_service(10000).unwrap();
        b.services
            .get_mut("nord-us")
            .unwrap()
            .depends_on
            .insert(MAIN_SERVICE.to_string());
        assert!(matches!(b.finalize(), Err(ManifestError::Cycle(_))));
    }

    #[test]
    fn test_external_network() {
        let mut b = ComposeBuilder::new(ManifestSettings {
            network_name: Some("proxy".to_string()),
            ..Default::default()
        });
        b.add_main_service(8443).unwrap();
        let manifest = b.finalize().unwrap();
        assert_eq!(manifest.network(), &NetworkSpec::External("proxy".to_string()));
        assert_eq!(manifest.service(MAIN_SERVICE).unwrap().networks, vec!["proxy"]);

        let yaml: serde_yaml::Value = serde_yaml::from_str(&manifest.to_yaml().unwrap()).unwrap();
        assert_eq!(yaml["networks"]["proxy"]["external"], serde_yaml::Value::Bool(true));
    }

    #[test]
    fn test_default_bridge_network_yaml() {
        let mut b = builder();
        b.add_main_service(10000).unwrap();
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&b.finalize().unwrap().to_yaml().unwrap()).unwrap();
        assert_eq!(
            yaml["networks"][DEFAULT_NETWORK]["driver"],
            serde_yaml::Value::String("bridge".to_string())
        );
        assert!(yaml["services"][MAIN_SERVICE]["depends_on"].is_null());
    }
}
