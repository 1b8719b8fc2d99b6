//! Xray configuration objects
//!
//! These mirror the sections of an Xray JSON config. [`ProxyConfig`] is only
//! obtainable through [`ProxyConfigBuilder::finalize`](super::ProxyConfigBuilder::finalize),
//! so every value of it has been validated.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// Fixed XHTTP path shared by the inbound and client links
pub const XHTTP_PATH: &str = "/xray";

/// VLESS flow control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Vision,
    Plain,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Vision => "xtls-rprx-vision",
            Flow::Plain => "none",
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Flow::Plain)
    }
}

impl std::str::FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "xtls-rprx-vision" | "vision" => Ok(Flow::Vision),
            "" | "none" | "plain" => Ok(Flow::Plain),
            other => Err(format!("unsupported flow '{}'", other)),
        }
    }
}

impl Serialize for Flow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One VLESS user of the inbound
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    pub id: Uuid,
    /// Routing key; Xray matches `user` rules against it
    #[serde(rename = "email")]
    pub label: String,
    #[serde(skip_serializing_if = "Flow::is_plain")]
    pub flow: Flow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireGuardSettings {
    pub secret_key: String,
    /// Interface addresses inside the tunnel
    pub addresses: Vec<String>,
    pub peer_public_key: String,
    /// `host:port` of the peer
    pub peer_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksAuth {
    pub user: String,
    pub pass: String,
}

/// Transport behind an outbound tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundKind {
    WireGuard(WireGuardSettings),
    Socks {
        address: String,
        port: u16,
        auth: Option<SocksAuth>,
    },
    Shadowsocks {
        address: String,
        port: u16,
        method: String,
        password: String,
    },
    Freedom,
    Blackhole,
}

impl OutboundKind {
    /// Xray protocol name
    pub fn protocol(&self) -> &'static str {
        match self {
            OutboundKind::WireGuard(_) => "wireguard",
            OutboundKind::Socks { .. } => "socks",
            OutboundKind::Shadowsocks { .. } => "shadowsocks",
            OutboundKind::Freedom => "freedom",
            OutboundKind::Blackhole => "blackhole",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundTunnel {
    pub tag: String,
    pub kind: OutboundKind,
}

impl Serialize for OutboundTunnel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("tag", &self.tag)?;
        map.serialize_entry("protocol", self.kind.protocol())?;

        match &self.kind {
            OutboundKind::WireGuard(wg) => {
                map.serialize_entry(
                    "settings",
                    &json!({
                        "secretKey": wg.secret_key,
                        "address": wg.addresses,
                        "peers": [{
                            "publicKey": wg.peer_public_key,
                            "endpoint": wg.peer_endpoint,
                        }],
                        "kernelMode": false,
                    }),
                )?;
            }
            OutboundKind::Socks {
                address,
                port,
                auth,
            } => {
                let mut server = json!({ "address": address, "port": port });
                if let Some(auth) = auth {
                    server["users"] = json!([{ "user": auth.user, "pass": auth.pass }]);
                }
                map.serialize_entry("settings", &json!({ "servers": [server] }))?;
            }
            OutboundKind::Shadowsocks {
                address,
                port,
                method,
                password,
            } => {
                map.serialize_entry(
                    "settings",
                    &json!({
                        "servers": [{
                            "address": address,
                            "port": port,
                            "method": method,
                            "password": password,
                        }],
                    }),
                )?;
            }
            OutboundKind::Freedom | OutboundKind::Blackhole => {}
        }

        map.end()
    }
}

/// A `field` routing rule. Conditions within one rule are ANDed by Xray.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "user", skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    #[serde(rename = "domain", skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(rename = "ip", skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,
    pub outbound_tag: String,
}

impl RoutingRule {
    fn field(outbound_tag: &str) -> Self {
        Self {
            kind: "field",
            users: Vec::new(),
            domains: Vec::new(),
            ips: Vec::new(),
            outbound_tag: outbound_tag.to_string(),
        }
    }

    pub fn for_user(label: &str, outbound_tag: &str) -> Self {
        Self {
            users: vec![label.to_string()],
            ..Self::field(outbound_tag)
        }
    }

    pub fn for_domains(domains: Vec<String>, outbound_tag: &str) -> Self {
        Self {
            domains,
            ..Self::field(outbound_tag)
        }
    }

    pub fn for_ips(ips: Vec<String>, outbound_tag: &str) -> Self {
        Self {
            ips,
            ..Self::field(outbound_tag)
        }
    }

    pub fn with_user(mut self, label: &str) -> Self {
        self.users.push(label.to_string());
        self
    }
}

/// Listener parameters of the single VLESS inbound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundSettings {
    pub port: u16,
    /// VLESS decryption key, `"none"` when encryption is disabled
    pub decryption: String,
}

/// Validated, immutable Xray configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub(super) log_level: String,
    pub(super) inbound: InboundSettings,
    pub(super) clients: Vec<ClientIdentity>,
    pub(super) outbounds: Vec<OutboundTunnel>,
    pub(super) rules: Vec<RoutingRule>,
}

impl ProxyConfig {
    pub fn inbound(&self) -> &InboundSettings {
        &self.inbound
    }

    pub fn clients(&self) -> &[ClientIdentity] {
        &self.clients
    }

    pub fn outbounds(&self) -> &[OutboundTunnel] {
        &self.outbounds
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Serialize)]
struct LogSection<'a> {
    loglevel: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Inbound<'a> {
    port: u16,
    listen: &'static str,
    protocol: &'static str,
    settings: InboundClients<'a>,
    stream_settings: StreamSettings,
}

#[derive(Serialize)]
struct InboundClients<'a> {
    clients: &'a [ClientIdentity],
    decryption: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamSettings {
    network: &'static str,
    xhttp_settings: XhttpSettings,
}

#[derive(Serialize)]
struct XhttpSettings {
    path: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutingSection<'a> {
    domain_strategy: &'static str,
    rules: &'a [RoutingRule],
}

#[derive(Serialize)]
struct XrayDocument<'a> {
    log: LogSection<'a>,
    inbounds: [Inbound<'a>; 1],
    outbounds: &'a [OutboundTunnel],
    routing: RoutingSection<'a>,
}

impl Serialize for ProxyConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        XrayDocument {
            log: LogSection {
                loglevel: &self.log_level,
            },
            inbounds: [Inbound {
                port: self.inbound.port,
                listen: "0.0.0.0",
                protocol: "vless",
                settings: InboundClients {
                    clients: &self.clients,
                    decryption: &self.inbound.decryption,
                },
                stream_settings: StreamSettings {
                    network: "xhttp",
                    xhttp_settings: XhttpSettings { path: XHTTP_PATH },
                },
            }],
            outbounds: &self.outbounds,
            routing: RoutingSection {
                domain_strategy: "IPIfNonMatch",
                rules: &self.rules,
            },
        }
        .serialize(serializer)
    }
}
