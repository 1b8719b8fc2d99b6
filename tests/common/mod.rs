#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use xray_gen::directory::types::{Technology, TechnologyMetadata};
use xray_gen::directory::{Capability, DirectoryApi, DirectoryError, RawCandidate, Region, Result};
use xray_gen::keygen::{KeyPair, KeySource, KeygenError};

/// What the fake directory answers for one region
pub enum Pool {
    Servers(Vec<RawCandidate>),
    /// Rate limited on every call
    Down,
    /// 404 on every call
    NotFound,
    /// Undecodable payload
    Malformed,
    /// Credentials rejected
    Rejected,
}

/// In-memory directory with a fixed catalog
pub struct FakeDirectory {
    pub catalog: Vec<Region>,
    pub pools: HashMap<String, Pool>,
    pub catalog_down: bool,
    pub candidate_calls: Cell<usize>,
}

impl FakeDirectory {
    pub fn new(catalog: Vec<Region>) -> Self {
        Self {
            catalog,
            pools: HashMap::new(),
            catalog_down: false,
            candidate_calls: Cell::new(0),
        }
    }

    pub fn with_pool(mut self, code: &str, pool: Pool) -> Self {
        self.pools.insert(code.to_string(), pool);
        self
    }
}

impl DirectoryApi for FakeDirectory {
    fn list_regions(&self) -> Result<Vec<Region>> {
        if self.catalog_down {
            return Err(DirectoryError::ServerError {
                status: 503,
                message: "maintenance".to_string(),
            });
        }
        Ok(self.catalog.clone())
    }

    fn fetch_candidates(
        &self,
        region: &Region,
        _capability: Capability,
        limit: usize,
    ) -> Result<Vec<RawCandidate>> {
        self.candidate_calls.set(self.candidate_calls.get() + 1);
        match self.pools.get(&region.code) {
            Some(Pool::Servers(servers)) => Ok(servers.iter().take(limit).cloned().collect()),
            Some(Pool::Down) => Err(DirectoryError::RateLimited),
            Some(Pool::NotFound) => Err(DirectoryError::ApiError {
                status: 404,
                message: "not found".to_string(),
            }),
            Some(Pool::Malformed) => Err(DirectoryError::ParseError(
                "expected value at line 1 column 1".to_string(),
            )),
            Some(Pool::Rejected) => Err(DirectoryError::Unauthorized),
            None => Ok(Vec::new()),
        }
    }
}

pub struct FixedKeys;

impl KeySource for FixedKeys {
    fn key_pair(&self) -> std::result::Result<KeyPair, KeygenError> {
        Ok(KeyPair {
            decryption: "mlkem768x25519plus.native.600s.SERVER".to_string(),
            encryption: "mlkem768x25519plus.native.0rtt.CLIENT".to_string(),
        })
    }
}

pub struct BrokenKeys;

impl KeySource for BrokenKeys {
    fn key_pair(&self) -> std::result::Result<KeyPair, KeygenError> {
        Err(KeygenError::Unparsable("xray vlessenc".to_string()))
    }
}

pub fn region(id: u64, code: &str, name: &str) -> Region {
    Region {
        id,
        code: code.to_string(),
        name: name.to_string(),
    }
}

/// A WireGuard-capable server
pub fn wireguard(host: &str, station: &str, load: Option<u8>) -> RawCandidate {
    RawCandidate {
        hostname: Some(host.to_string()),
        station: Some(station.to_string()),
        load,
        technologies: vec![Technology {
            id: Some(35),
            identifier: Some("wireguard_udp".to_string()),
            metadata: vec![TechnologyMetadata {
                name: "public_key".to_string(),
                value: serde_json::json!(format!("{host}-pubkey")),
            }],
        }],
        ..Default::default()
    }
}

/// A server that only offers OpenVPN
pub fn openvpn_only(host: &str, station: &str, load: Option<u8>) -> RawCandidate {
    RawCandidate {
        hostname: Some(host.to_string()),
        station: Some(station.to_string()),
        load,
        technologies: vec![Technology {
            id: Some(3),
            identifier: Some("openvpn_udp".to_string()),
            metadata: Vec::new(),
        }],
        ..Default::default()
    }
}
