//! `~/.galaxy-objects` configuration file.

use crate::error::{GalaxyError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GALAXY_API_KEY";
/// Environment variable holding the server URL.
pub const URL_VAR: &str = "GALAXY_URL";

const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";
const FILE_NAME: &str = ".galaxy-objects";

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct CliConfig {
    #[serde(rename = "GALAXY_URL", skip_serializing_if = "Option::is_none")]
    pub galaxy_url: Option<String>,
    #[serde(rename = "API_KEY", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "DEBUG", skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(rename = "TIMEOUT_SECS", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Let `GALAXY_URL` and `GALAXY_API_KEY` take precedence over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_var(URL_VAR) {
            self.galaxy_url = Some(url);
        }
        if let Some(key) = non_empty_var(API_KEY_VAR) {
            self.api_key = Some(key);
        }
        self
    }

    /// The API key; unset, empty and the `YOUR_API_KEY` placeholder all
    /// count as missing.
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() && key != PLACEHOLDER_KEY => Ok(key),
            _ => Err(GalaxyError::MissingCredential {
                variable: API_KEY_VAR,
            }),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(crate::client::DEFAULT_TIMEOUT)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn config_file_path() -> Result<PathBuf> {
    if let Some(home) = env::var_os("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home).join(FILE_NAME));
        }
    }

    if cfg!(windows) {
        if let Some(profile) = env::var_os("USERPROFILE") {
            if !profile.is_empty() {
                return Ok(PathBuf::from(profile).join(FILE_NAME));
            }
        }
    }

    Err(GalaxyError::Config {
        message: "Unable to determine home directory; pass --server and export GALAXY_API_KEY"
            .to_string(),
    })
}

/// Read the file at `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<CliConfig> {
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<CliConfig>(&contents).map_err(|e| GalaxyError::Config {
            message: format!("Failed to parse {} as TOML: {}", path.display(), e),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(CliConfig::default()),
        Err(err) if err.kind() == io::ErrorKind::IsADirectory => Err(GalaxyError::Config {
            message: format!(
                "Expected {} to be a TOML file, but found a directory",
                path.display()
            ),
        }),
        Err(err) => Err(GalaxyError::Config {
            message: format!("Failed to read {}: {}", path.display(), err),
        }),
    }
}

pub fn save_config(path: &Path, config: &CliConfig) -> Result<()> {
    let serialized = toml::to_string(config).map_err(|e| GalaxyError::Config {
        message: format!("Failed to serialize config to TOML: {}", e),
    })?;
    fs::write(path, serialized).map_err(|e| GalaxyError::Config {
        message: format!("Failed to write config to {}: {}", path.display(), e),
    })
}
