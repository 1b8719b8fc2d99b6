use crate::config::types::DirectorySettings;
use crate::directory::{DirectoryClient, NordApiClient};

/// Production directory client configured from `settings`
pub fn connect_directory(settings: &DirectorySettings) -> crate::Result<DirectoryClient<NordApiClient>> {
    let api = NordApiClient::with_url(&settings.api_url, settings.request_timeout)?;
    Ok(DirectoryClient::new(api).with_retry(settings.retry))
}
