//! Endpoint selection
//!
//! Turns a raw candidate pool into ranked endpoints. Capability support is a
//! hard filter applied before ranking: a candidate without the required
//! technology's public key never wins, whatever its load.

use crate::directory::types::{Capability, Endpoint, RawCandidate, UNKNOWN_LOAD, WIREGUARD_PORT};

/// Orders qualified endpoints, best first
pub trait RankingPolicy {
    fn rank(&self, endpoints: &mut [Endpoint]);
}

/// Ascending load; equal loads keep their directory order
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLoad;

impl RankingPolicy for LeastLoad {
    fn rank(&self, endpoints: &mut [Endpoint]) {
        // sort_by_key is stable, which resolves ties to first occurrence
        endpoints.sort_by_key(|e| e.load);
    }
}

#[derive(Debug, Clone, Default)]
pub struct EndpointSelector<P = LeastLoad> {
    policy: P,
}

impl EndpointSelector {
    pub fn new() -> Self {
        Self { policy: LeastLoad }
    }
}

impl<P: RankingPolicy> EndpointSelector<P> {
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    /// Convert a candidate into an endpoint if it is usable for `capability`
    pub fn qualify(candidate: &RawCandidate, capability: Capability) -> Option<Endpoint> {
        let public_key = candidate.public_key(capability)?;
        let address = candidate.station.as_deref().filter(|s| !s.is_empty())?;

        Some(Endpoint {
            address: address.to_string(),
            port: WIREGUARD_PORT,
            public_key: public_key.to_string(),
            hostname: candidate
                .hostname
                .clone()
                .unwrap_or_else(|| address.to_string()),
            load: candidate.load.unwrap_or(UNKNOWN_LOAD),
        })
    }

    /// All qualifying endpoints, best first
    pub fn rank(&self, candidates: &[RawCandidate], capability: Capability) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = candidates
            .iter()
            .filter_map(|c| Self::qualify(c, capability))
            .collect();
        self.policy.rank(&mut endpoints);
        endpoints
    }

    /// The single best endpoint, if any candidate qualifies
    pub fn select(&self, candidates: &[RawCandidate], capability: Capability) -> Option<Endpoint> {
        self.rank(candidates, capability).into_iter().next()
    }
}

/// Select with the default least-load policy
pub fn select(candidates: &[RawCandidate], capability: Capability) -> Option<Endpoint> {
    EndpointSelector::new().select(candidates, capability)
}
