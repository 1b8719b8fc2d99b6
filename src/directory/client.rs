use super::api::DirectoryApi;
use super::error::Result;
use super::retry::RetryPolicy;
use super::types::{Capability, Endpoint, Region};
use crate::selector::{EndpointSelector, LeastLoad, RankingPolicy};

/// Candidates requested per region so ranking happens locally
pub const DEFAULT_POOL_SIZE: usize = 30;

/// Resilient front for a [`DirectoryApi`]: retries transient failures and
/// reduces candidate pools to a single endpoint.
pub struct DirectoryClient<A, P = LeastLoad> {
    api: A,
    retry: RetryPolicy,
    selector: EndpointSelector<P>,
}

impl<A: DirectoryApi> DirectoryClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            selector: EndpointSelector::new(),
        }
    }
}

impl<A: DirectoryApi, P: RankingPolicy> DirectoryClient<A, P> {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_selector<Q: RankingPolicy>(self, selector: EndpointSelector<Q>) -> DirectoryClient<A, Q> {
        DirectoryClient {
            api: self.api,
            retry: self.retry,
            selector,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Full region catalog
    pub fn list_regions(&self) -> Result<Vec<Region>> {
        self.retry.run("region catalog", || self.api.list_regions())
    }

    /// Best endpoint for `region`, or `None` if no candidate qualifies.
    ///
    /// `Err` means the directory could not be reached within the retry
    /// budget; an empty or unusable pool is `Ok(None)`.
    pub fn find_best_endpoint(
        &self,
        region: &Region,
        capability: Capability,
        pool_size: usize,
    ) -> Result<Option<Endpoint>> {
        Ok(self
            .ranked_endpoints(region, capability, pool_size)?
            .into_iter()
            .next())
    }

    /// Every qualifying endpoint in `region`, best first
    pub fn ranked_endpoints(
        &self,
        region: &Region,
        capability: Capability,
        pool_size: usize,
    ) -> Result<Vec<Endpoint>> {
        let what = format!("server lookup for {}", region.code);
        let candidates = self.retry.run(&what, || {
            self.api.fetch_candidates(region, capability, pool_size.max(1))
        })?;
        log::debug!(
            "{}: {} candidates in pool",
            region.code,
            candidates.len()
        );
        Ok(self.selector.rank(&candidates, capability))
    }
}
