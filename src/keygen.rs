//! VLESS encryption key pair
//!
//! Keys come from an external command (by default `xray vlessenc`). Any
//! failure degrades to the `"none"` sentinel, which runs the inbound without
//! VLESS-level encryption.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::common::command_utils::execute_command;

/// Key value meaning "no VLESS encryption"
pub const FALLBACK_KEY: &str = "none";

static DECRYPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""decryption"\s*:\s*"([^"]+)""#).expect("valid regex"));
static ENCRYPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""encryption"\s*:\s*"([^"]+)""#).expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Server side, goes into the inbound
    pub decryption: String,
    /// Client side, goes into the links
    pub encryption: String,
}

impl KeyPair {
    pub fn fallback() -> Self {
        Self {
            decryption: FALLBACK_KEY.to_string(),
            encryption: FALLBACK_KEY.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.decryption == FALLBACK_KEY && self.encryption == FALLBACK_KEY
    }
}

#[derive(Debug, Error)]
pub enum KeygenError {
    #[error("key generation command is empty")]
    EmptyCommand,

    #[error("could not run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("no decryption/encryption pair found in the output of '{0}'")]
    Unparsable(String),
}

/// Source of the VLESS key pair
pub trait KeySource {
    fn key_pair(&self) -> Result<KeyPair, KeygenError>;
}

/// Runs a local command and scrapes the key pair from its output
#[derive(Debug, Clone)]
pub struct CommandKeySource {
    command: Vec<String>,
}

impl CommandKeySource {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl KeySource for CommandKeySource {
    fn key_pair(&self) -> Result<KeyPair, KeygenError> {
        let (program, args) = self.command.split_first().ok_or(KeygenError::EmptyCommand)?;
        let display = self.command.join(" ");

        let output = execute_command(program, args).map_err(|source| KeygenError::Spawn {
            command: display.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(KeygenError::Failed {
                command: display,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_key_pair(&String::from_utf8_lossy(&output.stdout))
            .ok_or(KeygenError::Unparsable(display))
    }
}

/// Extract `"decryption": "..."` and `"encryption": "..."` from command output
pub fn parse_key_pair(output: &str) -> Option<KeyPair> {
    let decryption = DECRYPTION_RE.captures(output)?.get(1)?.as_str().to_string();
    let encryption = ENCRYPTION_RE.captures(output)?.get(1)?.as_str().to_string();
    Some(KeyPair {
        decryption,
        encryption,
    })
}

/// Key pair from `source`, or the fallback pair with a warning
pub fn resolve_key_pair(source: &dyn KeySource) -> KeyPair {
    match source.key_pair() {
        Ok(pair) => pair,
        Err(e) => {
            log::warn!(
                "VLESS key generation unavailable ({}); falling back to encryption '{}'",
                e,
                FALLBACK_KEY
            );
            KeyPair::fallback()
        }
    }
}
