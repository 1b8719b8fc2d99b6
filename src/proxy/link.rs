use super::types::{ClientIdentity, XHTTP_PATH};

/// Port clients connect to; TLS is terminated in front of the inbound
pub const PUBLIC_PORT: u16 = 443;

/// Domain used when none is configured; links must be edited before use
pub const DOMAIN_PLACEHOLDER: &str = "<YOUR_DOMAIN>";

/// Shareable `vless://` link for one client
pub fn client_link(client: &ClientIdentity, domain: &str, encryption: &str) -> String {
    format!(
        "vless://{}@{}:{}?type=xhttp&path={}&encryption={}&security=tls&flow={}#{}",
        client.id,
        domain,
        PUBLIC_PORT,
        XHTTP_PATH,
        encryption,
        client.flow.as_str(),
        client.label
    )
}
