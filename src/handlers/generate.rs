use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GenerateArgs;
use crate::config::{load_config, resolve_settings, types::Settings};
use crate::keygen::CommandKeySource;
use crate::orchestrator::{ConfigBundle, GenerationOutcome, Orchestrator, SkipReason};
use crate::proxy::{DOMAIN_PLACEHOLDER, client_link};

use super::utils::connect_directory;

pub const CONFIG_FILE: &str = "config.json";
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Serialized artifacts of one run
#[derive(Debug, Clone)]
pub struct RenderedArtifacts {
    pub config_json: String,
    pub compose_yaml: String,
}

pub fn handle_generate(args: GenerateArgs, config_path: Option<&Path>) -> crate::Result<()> {
    let file = load_config(config_path)?;
    let settings = resolve_settings(&args, &file)?;

    println!(
        "🔍 Looking up WireGuard servers for {}...",
        settings.region_codes.join(", ")
    );

    let directory = connect_directory(&settings.directory)?;
    let keys = CommandKeySource::new(settings.keygen_command.clone());
    let outcome = Orchestrator::new(&settings, &directory, &keys).run()?;

    // Both files are rendered before either is written
    let rendered = render_artifacts(&outcome.bundle)?;

    print_summary(&outcome);

    if args.dry_run {
        println!("\n--- {} (dry run) ---", CONFIG_FILE);
        println!("{}", rendered.config_json);
        println!("--- {} (dry run) ---", COMPOSE_FILE);
        println!("{}", rendered.compose_yaml);
    } else {
        let written = write_artifacts(&settings.output_dir, &rendered)?;
        for path in &written {
            println!("✅ Wrote {}", path.display());
        }
        if !outcome.is_empty() && outcome.bundle.manifest.services().len() > 1 {
            println!(
                "{}",
                "   Relay passwords are regenerated on every run; redeploy both files together."
                    .dimmed()
            );
        }
    }

    print_links(&settings, &outcome);

    Ok(())
}

pub fn render_artifacts(bundle: &ConfigBundle) -> crate::Result<RenderedArtifacts> {
    Ok(RenderedArtifacts {
        config_json: bundle.proxy.to_json_pretty()?,
        compose_yaml: bundle.manifest.to_yaml()?,
    })
}

/// Write both artifacts into `dir`, creating it when needed.
///
/// Each file goes to a temporary sibling first and is renamed into place once
/// both writes succeeded. Staged files are removed if any write fails.
pub fn write_artifacts(dir: &Path, rendered: &RenderedArtifacts) -> crate::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let files = [
        (dir.join(CONFIG_FILE), rendered.config_json.as_str()),
        (dir.join(COMPOSE_FILE), rendered.compose_yaml.as_str()),
    ];

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    for (path, content) in &files {
        let tmp = staged_path(path);
        if let Err(e) = fs::write(&tmp, content) {
            let _ = fs::remove_file(&tmp);
            discard_staged(&staged);
            return Err(e.into());
        }
        staged.push((tmp, path.clone()));
    }
    for (tmp, path) in &staged {
        if let Err(e) = fs::rename(tmp, path) {
            discard_staged(&staged);
            return Err(e.into());
        }
    }

    Ok(files.into_iter().map(|(path, _)| path).collect())
}

fn staged_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Could not remove {}: {}", tmp.display(), e);
            }
        }
    }
}

fn print_summary(outcome: &GenerationOutcome) {
    println!("\n{}", "🌍 Regions".bright_white().bold());
    for done in &outcome.processed {
        let detail = match &done.endpoint {
            Some(endpoint) => format!("{} ({}% load)", endpoint.hostname, endpoint.load),
            None => "server chosen by sidecar".to_string(),
        };
        println!(
            "   {} {} ({}) -> {}",
            "✓".bright_green(),
            done.region.name,
            done.region.code,
            detail.bright_cyan()
        );
    }
    for skip in &outcome.skipped {
        let reason = match &skip.reason {
            SkipReason::NoEndpoint => "no WireGuard server".to_string(),
            SkipReason::Unavailable(e) => format!("directory unavailable: {}", e),
            SkipReason::Failed(e) => format!("lookup failed: {}", e),
        };
        println!(
            "   {} {} ({}) skipped: {}",
            "✗".bright_red(),
            skip.region.name,
            skip.region.code,
            reason.yellow()
        );
    }

    if outcome.key_pair.is_fallback() {
        println!(
            "{}",
            "⚠️  VLESS encryption disabled: key generation was unavailable".yellow()
        );
    }
    if outcome.is_empty() {
        println!(
            "\n{}",
            "⚠️  No region produced a tunnel. The config only contains the default outbounds."
                .bright_yellow()
                .bold()
        );
    }
}

fn print_links(settings: &Settings, outcome: &GenerationOutcome) {
    let clients = outcome.bundle.proxy.clients();
    if clients.is_empty() {
        return;
    }

    println!("\n{}", "🔗 Client links".bright_white().bold());
    for client in clients {
        println!(
            "   {}",
            client_link(client, &settings.public_domain, &outcome.key_pair.encryption)
        );
    }
    if settings.public_domain == DOMAIN_PLACEHOLDER {
        println!(
            "\n💡 Replace {} with your domain, or set XRAY_DOMAIN.",
            DOMAIN_PLACEHOLDER
        );
    }
}
