use colored::*;
use std::path::Path;

use crate::config::{directory_settings, load_config};
use crate::directory::NordApiClient;

/// Print the account's NordLynx private key
pub fn handle_fetch_key(token: &str, config_path: Option<&Path>) -> crate::Result<()> {
    let file = load_config(config_path)?;
    let settings = directory_settings(&file)?;
    let client = NordApiClient::with_url(&settings.api_url, settings.request_timeout)?;

    println!("🔑 Fetching NordLynx private key...");
    let key = client.fetch_private_key(token.trim())?;

    println!("{}", key.bright_green().bold());
    println!(
        "\n💡 Export it as NORD_PRIVATE_KEY or pass it with --private-key. Keep it secret."
    );
    Ok(())
}
