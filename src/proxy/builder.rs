use std::collections::HashSet;

use uuid::Uuid;

use super::AssemblyError;
use super::types::{
    ClientIdentity, Flow, InboundSettings, OutboundKind, OutboundTunnel, ProxyConfig, RoutingRule,
};

/// Tag of the default blackhole outbound
pub const BLOCKED_TAG: &str = "blocked";
/// Tag of the default freedom outbound
pub const DIRECT_TAG: &str = "direct";
/// Geo category always routed to [`BLOCKED_TAG`]
pub const DOMESTIC_BLOCKLIST: &str = "geosite:cn";

pub const DEFAULT_LOG_LEVEL: &str = "warning";

/// Accumulates clients, outbounds and routing rules for one Xray config.
///
/// Only additive operations are exposed; [`finalize`](Self::finalize)
/// consumes the builder and checks every cross reference before handing out
/// a [`ProxyConfig`].
#[derive(Debug)]
pub struct ProxyConfigBuilder {
    log_level: String,
    inbound: InboundSettings,
    clients: Vec<ClientIdentity>,
    labels: HashSet<String>,
    outbounds: Vec<OutboundTunnel>,
    tags: HashSet<String>,
    rules: Vec<RoutingRule>,
}

impl ProxyConfigBuilder {
    /// Start a config with the fixed baseline: `blocked` and `direct`
    /// outbounds plus the domestic blocklist rule.
    pub fn new(inbound: InboundSettings) -> Self {
        let baseline = [
            OutboundTunnel {
                tag: BLOCKED_TAG.to_string(),
                kind: OutboundKind::Blackhole,
            },
            OutboundTunnel {
                tag: DIRECT_TAG.to_string(),
                kind: OutboundKind::Freedom,
            },
        ];

        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            inbound,
            clients: Vec::new(),
            labels: HashSet::new(),
            tags: baseline.iter().map(|o| o.tag.clone()).collect(),
            outbounds: baseline.into(),
            rules: vec![RoutingRule::for_domains(
                vec![DOMESTIC_BLOCKLIST.to_string()],
                BLOCKED_TAG,
            )],
        }
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Register a VLESS user and return its generated id
    pub fn add_client(&mut self, label: impl Into<String>, flow: Flow) -> Result<Uuid, AssemblyError> {
        let label = label.into();
        if !self.labels.insert(label.clone()) {
            return Err(AssemblyError::DuplicateClient(label));
        }

        let mut id = Uuid::new_v4();
        while self.clients.iter().any(|c| c.id == id) {
            id = Uuid::new_v4();
        }

        self.clients.push(ClientIdentity { id, label, flow });
        Ok(id)
    }

    pub fn add_tunnel(&mut self, tag: impl Into<String>, kind: OutboundKind) -> Result<(), AssemblyError> {
        let tag = tag.into();
        if !self.tags.insert(tag.clone()) {
            return Err(AssemblyError::DuplicateTunnel(tag));
        }
        self.outbounds.push(OutboundTunnel { tag, kind });
        Ok(())
    }

    /// Send all traffic of client `label` to `tag`.
    ///
    /// `tag` may be registered later; it is checked by `finalize`.
    pub fn add_route(&mut self, label: &str, tag: &str) {
        self.rules.push(RoutingRule::for_user(label, tag));
    }

    /// Deny `label` access to the given destinations, ahead of every other rule.
    ///
    /// Xray ANDs the conditions of a single rule, so IP and domain patterns
    /// are emitted as two rules; empty pattern lists emit nothing.
    pub fn add_blocking_rule(&mut self, label: &str, ip_patterns: &[&str], domain_patterns: &[&str]) {
        let mut front = Vec::with_capacity(2);
        if !ip_patterns.is_empty() {
            front.push(
                RoutingRule::for_ips(to_strings(ip_patterns), BLOCKED_TAG).with_user(label),
            );
        }
        if !domain_patterns.is_empty() {
            front.push(
                RoutingRule::for_domains(to_strings(domain_patterns), BLOCKED_TAG).with_user(label),
            );
        }
        front.append(&mut self.rules);
        self.rules = front;
    }

    pub fn finalize(self) -> Result<ProxyConfig, AssemblyError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if !self.tags.contains(&rule.outbound_tag) {
                return Err(AssemblyError::UnknownOutbound {
                    tag: rule.outbound_tag.clone(),
                    index,
                });
            }
            if let Some(label) = rule.users.iter().find(|u| !self.labels.contains(*u)) {
                return Err(AssemblyError::UnknownClient {
                    label: label.clone(),
                    index,
                });
            }
        }

        log::debug!(
            "proxy config: {} clients, {} outbounds, {} rules",
            self.clients.len(),
            self.outbounds.len(),
            self.rules.len()
        );

        Ok(ProxyConfig {
            log_level: self.log_level,
            inbound: self.inbound,
            clients: self.clients,
            outbounds: self.outbounds,
            rules: self.rules,
        })
    }
}

fn to_strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::types::WireGuardSettings;

    fn builder() -> ProxyConfigBuilder {
        ProxyConfigBuilder::new(InboundSettings {
            port: 10000,
            decryption: "none".to_string(),
        })
    }

    fn wireguard(peer: &str) -> OutboundKind {
        OutboundKind::WireGuard(WireGuardSettings {
            secret_key: "SECRET".to_string(),
            addresses: vec!["10.5.0.2/32".to_string()],
            peer_public_key: peer.to_string(),
            peer_endpoint: "198.51.100.1:51820".to_string(),
        })
    }

    #[test]
    fn test_baseline_is_present() {
        let config = builder().finalize().unwrap();
        let tags: Vec<&str> = config.outbounds().iter().map(|o| o.tag.as_str()).collect();
        assert_eq!(tags, vec![BLOCKED_TAG, DIRECT_TAG]);
        assert_eq!(config.rules().len(), 1);
        assert_eq!(config.rules()[0].domains, vec![DOMESTIC_BLOCKLIST]);
        assert_eq!(config.rules()[0].outbound_tag, BLOCKED_TAG);
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut b = builder();
        b.add_tunnel("nordvpn-us", wireguard("A")).unwrap();
        assert_eq!(
            b.add_tunnel("nordvpn-us", wireguard("B")),
            Err(AssemblyError::DuplicateTunnel("nordvpn-us".to_string()))
        );
        assert!(matches!(
            b.add_tunnel(DIRECT_TAG, OutboundKind::Freedom),
            Err(AssemblyError::DuplicateTunnel(_))
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut b = builder();
        b.add_client("us.user@example.com", Flow::Vision).unwrap();
        assert_eq!(
            b.add_client("us.user@example.com", Flow::Plain),
            Err(AssemblyError::DuplicateClient("us.user@example.com".to_string()))
        );
    }

    #[test]
    fn test_route_may_precede_its_tunnel() {
        let mut b = builder();
        b.add_client("jp.user@example.com", Flow::Vision).unwrap();
        b.add_route("jp.user@example.com", "nordvpn-jp");
        b.add_tunnel("nordvpn-jp", wireguard("JP")).unwrap();
        assert!(b.finalize().is_ok());
    }

    #[test]
    fn test_dangling_route_fails_finalize() {
        let mut b = builder();
        b.add_client("jp.user@example.com", Flow::Vision).unwrap();
        b.add_route("jp.user@example.com", "nordvpn-jp");
        assert_eq!(
            b.finalize(),
            Err(AssemblyError::UnknownOutbound {
                tag: "nordvpn-jp".to_string(),
                index: 1
            })
        );
    }

    #[test]
    fn test_route_for_unknown_client_fails_finalize() {
        let mut b = builder();
        b.add_route("ghost@example.com", DIRECT_TAG);
        assert!(matches!(
            b.finalize(),
            Err(AssemblyError::UnknownClient { .. })
        ));
    }

    #[test]
    fn test_blocking_rules_go_first() {
        let mut b = builder();
        b.add_client("direct.user@example.com", Flow::Vision).unwrap();
        b.add_blocking_rule("direct.user@example.com", &["10.0.0.0/8"], &["localhost"]);
        b.add_route("direct.user@example.com", DIRECT_TAG);
        let config = b.finalize().unwrap();
        let rules = config.rules();

        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].ips, vec!["10.0.0.0/8"]);
        assert_eq!(rules[0].users, vec!["direct.user@example.com"]);
        assert_eq!(rules[1].domains, vec!["localhost"]);
        assert_eq!(rules[2].domains, vec![DOMESTIC_BLOCKLIST]);
        assert_eq!(rules[3].outbound_tag, DIRECT_TAG);
        assert!(rules[..3].iter().all(|r| r.outbound_tag == BLOCKED_TAG));
    }

    #[test]
    fn test_blocking_rule_with_no_patterns_is_noop() {
        let mut b = builder();
        b.add_client("x@example.com", Flow::Vision).unwrap();
        b.add_blocking_rule("x@example.com", &[], &[]);
        assert_eq!(b.finalize().unwrap().rules().len(), 1);
    }

    #[test]
    fn test_client_ids_are_unique() {
        let mut b = builder();
        let a = b.add_client("a", Flow::Vision).unwrap();
        let c = b.add_client("b", Flow::Vision).unwrap();
        assert_ne!(a, c);
    }
}
