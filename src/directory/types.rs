//! Payload types for the NordVPN directory API
//!
//! Only the fields the generator reads are modelled; everything else in the
//! upstream payloads is ignored by serde.

use serde::{Deserialize, Serialize};

/// Default WireGuard (NordLynx) listening port on every directory server
pub const WIREGUARD_PORT: u16 = 51820;

/// Load assumed for candidates that do not report one
pub const UNKNOWN_LOAD: u8 = 100;

/// A selectable country from `GET /v1/countries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Directory-assigned country id, used in server filters
    pub id: u64,
    /// ISO-like short code ("US", "JP", ...)
    pub code: String,
    /// Display name ("United States")
    pub name: String,
}

impl Region {
    /// Case-insensitive code comparison used by user-supplied filters
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }
}

/// Tunnel technology a candidate server must support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Numeric technology id (v2 API filters)
    pub id: u64,
    /// Technology identifier (v1 API filters and payloads)
    pub identifier: &'static str,
}

impl Capability {
    pub const WIREGUARD_UDP: Capability = Capability {
        id: 35,
        identifier: "wireguard_udp",
    };
}

/// One server entry as returned by the directory, before any filtering
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    /// Public IPv4 address of the server
    #[serde(default)]
    pub station: Option<String>,
    /// Current load in percent
    #[serde(default)]
    pub load: Option<u8>,
    #[serde(default)]
    pub technologies: Vec<Technology>,
}

impl RawCandidate {
    /// Public key advertised for `capability`, if the candidate supports it
    pub fn public_key(&self, capability: Capability) -> Option<&str> {
        self.technologies
            .iter()
            .filter(|t| t.is(capability))
            .flat_map(|t| t.metadata.iter())
            .find(|m| m.name == "public_key")
            .and_then(|m| m.value.as_str())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Technology {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub metadata: Vec<TechnologyMetadata>,
}

impl Technology {
    pub fn is(&self, capability: Capability) -> bool {
        self.identifier.as_deref() == Some(capability.identifier) || self.id == Some(capability.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechnologyMetadata {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Server listings come back either as a bare array (v1 recommendations) or
/// wrapped with their location table (v2 servers).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CandidateEnvelope {
    Flat(Vec<RawCandidate>),
    Keyed {
        #[serde(default)]
        servers: Vec<RawCandidate>,
    },
}

impl CandidateEnvelope {
    pub fn into_candidates(self) -> Vec<RawCandidate> {
        match self {
            CandidateEnvelope::Flat(servers) | CandidateEnvelope::Keyed { servers } => servers,
        }
    }
}

/// The chosen tunnel terminus for one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
    pub public_key: String,
    pub hostname: String,
    pub load: u8,
}

impl Endpoint {
    /// `address:port` as expected by WireGuard peers
    pub fn socket(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Response of `GET /v1/users/services/credentials`
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCredentials {
    #[serde(default)]
    pub nordlynx_private_key: Option<String>,
}

/// API error response format
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub errors: Option<ApiErrorDetail>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: Option<String>,
}

impl ApiErrorResponse {
    /// Get the error message, preferring the nested detail
    pub fn get_message(&self) -> String {
        self.errors
            .as_ref()
            .and_then(|e| e.message.clone())
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_listing_parses() {
        let body = r#"[{"hostname":"us1.nordvpn.com","station":"1.2.3.4","load":12,
            "technologies":[{"id":35,"identifier":"wireguard_udp",
            "metadata":[{"name":"public_key","value":"KEY="}]}]}]"#;
        let envelope: CandidateEnvelope = serde_json::from_str(body).unwrap();
        let servers = envelope.into_candidates();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].public_key(Capability::WIREGUARD_UDP), Some("KEY="));
    }

    #[test]
    fn test_keyed_listing_parses() {
        let body = r#"{"servers":[{"hostname":"jp5.nordvpn.com","station":"5.6.7.8","load":3,
            "technologies":[{"id":35,"metadata":[{"name":"public_key","value":"JPKEY"}]}]}],
            "locations":[{"id":1,"country":{"id":108,"code":"JP"}}]}"#;
        let envelope: CandidateEnvelope = serde_json::from_str(body).unwrap();
        let servers = envelope.into_candidates();
        assert_eq!(servers.len(), 1);
        // Matched by numeric id when the identifier is absent
        assert_eq!(servers[0].public_key(Capability::WIREGUARD_UDP), Some("JPKEY"));
    }

    #[test]
    fn test_public_key_ignores_other_technologies() {
        let candidate = RawCandidate {
            technologies: vec![Technology {
                id: Some(5),
                identifier: Some("openvpn_udp".to_string()),
                metadata: vec![TechnologyMetadata {
                    name: "public_key".to_string(),
                    value: serde_json::json!("NOT_WG"),
                }],
            }],
            ..Default::default()
        };
        assert_eq!(candidate.public_key(Capability::WIREGUARD_UDP), None);
    }

    #[test]
    fn test_region_code_match_is_case_insensitive() {
        let region = Region {
            id: 228,
            code: "US".to_string(),
            name: "United States".to_string(),
        };
        assert!(region.matches_code("us"));
        assert!(region.matches_code(" Us "));
        assert!(!region.matches_code("UK"));
    }
}
