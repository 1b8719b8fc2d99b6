use colored::*;
use std::path::Path;

use crate::config::{directory_settings, load_config};
use crate::directory::Capability;
use crate::error::GeneratorError;
use crate::orchestrator::filter_regions;

use super::utils::connect_directory;

/// List qualifying WireGuard servers of one region, best first
pub fn handle_candidates(region: &str, limit: usize, config_path: Option<&Path>) -> crate::Result<()> {
    let file = load_config(config_path)?;
    let settings = directory_settings(&file)?;
    let directory = connect_directory(&settings)?;

    let wanted = vec![region.trim().to_uppercase()];
    let region = filter_regions(directory.list_regions()?, &wanted)
        .into_iter()
        .next()
        .ok_or_else(|| GeneratorError::NoMatchingRegions {
            requested: wanted.join(","),
        })?;

    let ranked = directory.ranked_endpoints(&region, Capability::WIREGUARD_UDP, limit.max(1))?;

    println!(
        "\n{} {} ({})",
        "📡 WireGuard servers in".bright_white().bold(),
        region.name.bright_white().bold(),
        region.code
    );
    if ranked.is_empty() {
        println!("{}", "   No qualifying server found".yellow());
        return Ok(());
    }

    println!("   {:<32} {:>5}  {}", "Hostname", "Load", "Station");
    println!("   {}", "─".repeat(60).bright_blue());
    for (i, endpoint) in ranked.iter().enumerate() {
        let hostname = format!("{:<32}", endpoint.hostname);
        let hostname = if i == 0 {
            hostname.bright_green().to_string()
        } else {
            hostname
        };
        println!("   {} {:>4}%  {}", hostname, endpoint.load, endpoint.address);
    }
    Ok(())
}
