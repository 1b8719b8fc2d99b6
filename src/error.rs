use thiserror::Error;

use crate::directory::DirectoryError;
use crate::manifest::ManifestError;
use crate::proxy::AssemblyError;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Proxy config assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Deployment manifest assembly failed: {0}")]
    Manifest(#[from] ManifestError),

    #[error("None of the requested regions ({requested}) exist in the directory")]
    NoMatchingRegions { requested: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("NORD_PRIVATE_KEY is missing.\n\n{}", MISSING_KEY_HELP)]
    MissingPrivateKey,

    #[error(
        "NORD_COUNTRIES is missing.\n\nProvide a comma separated list of country codes (e.g. 'US,JP,UK').\nThere is no 'ALL' default, to keep directory API usage reasonable."
    )]
    MissingRegions,

    #[error("Failed to read config file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to parse config file: {0}")]
    ParsingFailed(String),

    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

const MISSING_KEY_HELP: &str = "\
You must provide your NordVPN WireGuard private key.

OPTIONS:
A) You have a NordVPN access token:
   xray-gen fetch-key --token <YOUR_TOKEN>

B) You want to find the key manually:
   Check 'Service Credentials' in the NordVPN dashboard, or read it from a running client.

C) You need a NEW key:
   Use 'wg genkey' locally; this tool does not generate keys.";

pub type Result<T> = std::result::Result<T, GeneratorError>;
