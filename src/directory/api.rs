//! NordVPN directory API client
//!
//! Issues single, blocking requests. Retrying and ranking are layered on top
//! by [`DirectoryClient`](super::DirectoryClient).

use super::error::{DirectoryError, Result};
use super::types::{
    ApiErrorResponse, Capability, CandidateEnvelope, RawCandidate, Region, ServiceCredentials,
};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Production API URL
pub const NORD_API_URL: &str = "https://api.nordvpn.com";

/// Per-request timeout unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent for API requests
const USER_AGENT: &str = concat!("xray-gen/", env!("CARGO_PKG_VERSION"));

/// Upstream listing operations the generator depends on
pub trait DirectoryApi {
    /// Fetch the full region catalog
    fn list_regions(&self) -> Result<Vec<Region>>;

    /// Fetch up to `limit` candidate servers in `region` supporting `capability`
    fn fetch_candidates(
        &self,
        region: &Region,
        capability: Capability,
        limit: usize,
    ) -> Result<Vec<RawCandidate>>;
}

/// Blocking HTTP client for the NordVPN public API
pub struct NordApiClient {
    /// HTTP client with configured timeout and headers
    http_client: Client,
    /// Base API URL
    api_url: String,
}

impl NordApiClient {
    /// Create a client against the production API
    pub fn new() -> Result<Self> {
        Self::with_url(NORD_API_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom API URL and per-request timeout
    pub fn with_url(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DirectoryError::HttpError)?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the configured API URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        log::debug!("GET {}", url);
        let response = self.http_client.get(&url).send()?;
        Self::handle_response(response)
    }

    /// Handle the HTTP response, converting errors appropriately
    fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .map_err(|e| DirectoryError::ParseError(e.to_string()));
        }

        let status_code = status.as_u16();
        let error_body = response.text().unwrap_or_default();
        let error_message = serde_json::from_str::<ApiErrorResponse>(&error_body)
            .map(|e| e.get_message())
            .unwrap_or_else(|_| error_body.clone());

        match status_code {
            401 | 403 => Err(DirectoryError::Unauthorized),
            429 => Err(DirectoryError::RateLimited),
            500..=599 => Err(DirectoryError::ServerError {
                status: status_code,
                message: error_message,
            }),
            _ => Err(DirectoryError::ApiError {
                status: status_code,
                message: error_message,
            }),
        }
    }

    /// Retrieve the account's NordLynx private key using an access token
    ///
    /// Endpoint: GET /v1/users/services/credentials (basic auth `token:<TOKEN>`)
    pub fn fetch_private_key(&self, token: &str) -> Result<String> {
        let url = format!("{}/v1/users/services/credentials", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .basic_auth("token", Some(token))
            .send()?;

        let credentials: ServiceCredentials = Self::handle_response(response)?;
        credentials
            .nordlynx_private_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                DirectoryError::ParseError("response has no nordlynx_private_key".to_string())
            })
    }
}

impl DirectoryApi for NordApiClient {
    /// Endpoint: GET /v1/countries
    fn list_regions(&self) -> Result<Vec<Region>> {
        self.get("/v1/countries")
    }

    /// Endpoint: GET /v1/servers/recommendations
    fn fetch_candidates(
        &self,
        region: &Region,
        capability: Capability,
        limit: usize,
    ) -> Result<Vec<RawCandidate>> {
        let envelope: CandidateEnvelope = self.get(&candidates_path(region, capability, limit))?;
        Ok(envelope.into_candidates())
    }
}

fn candidates_path(region: &Region, capability: Capability, limit: usize) -> String {
    format!(
        "/v1/servers/recommendations?filters[servers_technologies][identifier]={}&filters[country_id]={}&limit={}",
        capability.identifier, region.id, limit
    )
}
