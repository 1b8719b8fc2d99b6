pub mod types;

use crate::cli::GenerateArgs;
use crate::manifest::supports_socks_relay;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use types::{
    DirectorySettings, FileConfig, RelayProtocol, Settings, TunnelStrategy, split_command,
};

const CONFIG_FILE_NAME: &str = ".xray-gen.toml";

/// Get the global config file path (~/.xray-gen.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (./.xray-gen.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParsingFailed(e.to_string()))
}

/// Load the settings file.
///
/// An explicit path must exist and parse. Otherwise the local file is tried
/// first, then the global one; unreadable discovered files are skipped with a
/// warning and defaults are used.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let candidates = [Some(local_config_path(Path::new("."))), global_config_path()];
    for path in candidates.into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        match read_config(&path) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
        }
    }

    Ok(FileConfig::default())
}

/// Split, trim and upper-case a comma separated region list
pub fn parse_region_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Build the run settings from CLI/environment input and the settings file
pub fn resolve_settings(args: &GenerateArgs, file: &FileConfig) -> Result<Settings, ConfigError> {
    let private_key = args
        .private_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingPrivateKey)?;

    let region_codes = parse_region_codes(args.countries.as_deref().unwrap_or_default());
    if region_codes.is_empty() {
        return Err(ConfigError::MissingRegions);
    }

    if args.port == 0 {
        return Err(invalid("port", "must be between 1 and 65535"));
    }

    let mut settings = Settings::new(private_key, region_codes);
    settings.listen_port = args.port;
    settings.enable_direct = args.direct;
    settings.strategy = if args.sidecars {
        TunnelStrategy::Sidecar
    } else {
        TunnelStrategy::Direct
    };
    settings.relay = args.relay;
    settings.pin_sidecar_hosts = args.pin_hosts;
    settings.network_name = args
        .network
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if let Some(domain) = args.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        settings.public_domain = domain.to_string();
    }

    if let Some(flow) = &file.flow {
        settings.flow = flow.parse().map_err(|message: String| invalid("flow", &message))?;
    }
    if let Some(level) = &file.output.log_level {
        settings.log_level = level.clone();
    }
    if let Some(dir) = args.output.as_ref().or(file.output.dir.as_ref()) {
        settings.output_dir = dir.clone();
    }
    if let Some(image) = &file.images.xray {
        settings.xray_image = image.clone();
    }
    if let Some(image) = &file.images.sidecar {
        settings.sidecar_image = image.clone();
    }
    if let Some(command) = &file.keygen.command {
        settings.keygen_command = split_command(command);
        if settings.keygen_command.is_empty() {
            return Err(invalid("keygen.command", "must not be empty"));
        }
    }

    if settings.strategy == TunnelStrategy::Sidecar
        && settings.relay == RelayProtocol::Socks
        && !supports_socks_relay(&settings.sidecar_image)
    {
        return Err(invalid(
            "relay",
            &format!(
                "'{}' has no SOCKS server; use --relay shadowsocks or set images.sidecar",
                settings.sidecar_image
            ),
        ));
    }

    settings.directory = directory_settings(file)?;

    Ok(settings)
}

/// Directory access tuning from the settings file
pub fn directory_settings(file: &FileConfig) -> Result<DirectorySettings, ConfigError> {
    let mut settings = DirectorySettings::default();
    let directory = &file.directory;

    if let Some(url) = &directory.api_url {
        settings.api_url = url.clone();
    }
    if let Some(pool) = directory.pool_size {
        if pool == 0 {
            return Err(invalid("directory.pool_size", "must be at least 1"));
        }
        settings.pool_size = pool;
    }
    if let Some(attempts) = directory.retry_attempts {
        settings.retry.attempts = attempts.max(1);
    }
    if let Some(ms) = directory.retry_backoff_ms {
        settings.retry.backoff = Duration::from_millis(ms);
    }
    if let Some(secs) = directory.request_timeout_secs {
        settings.request_timeout = Duration::from_secs(secs);
    }

    Ok(settings)
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}
