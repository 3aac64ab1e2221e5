use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ecosystem::Ecosystem;

// =============================================================================
// Threat database locations
// =============================================================================

/// Threats directory relative to the working directory
pub const LOCAL_THREATS_DIR: &str = "threats";

/// Threats directory inside the container image
pub const CONTAINER_THREATS_DIR: &str = "/app/threats";

/// Scanner configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Directory holding `<threat>.csv` files; auto-detected when unset
    pub threats_dir: Option<PathBuf>,
    pub ecosystems: EcosystemsConfig,
    pub fallback: FallbackConfig,
}

/// Ecosystem-specific configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EcosystemsConfig {
    pub npm: EcosystemConfig,
    pub maven: EcosystemConfig,
    pub pip: EcosystemConfig,
}

/// Individual ecosystem configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EcosystemConfig {
    pub enabled: bool,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Behavior for declared versions no grammar accepts
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FallbackConfig {
    /// Match the raw string as an exact literal, tagged low confidence
    pub exact_on_parse_error: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            exact_on_parse_error: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ScanConfig {
    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicit config file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = config_path();
                if path.is_file() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn is_enabled(&self, ecosystem: Ecosystem) -> bool {
        match ecosystem {
            Ecosystem::Npm => self.ecosystems.npm.enabled,
            Ecosystem::Maven => self.ecosystems.maven.enabled,
            Ecosystem::Pip => self.ecosystems.pip.enabled,
        }
    }

    /// Returns the threats directory: the configured one, else `./threats`
    /// or `/app/threats`, whichever exists first.
    pub fn resolve_threats_dir(&self) -> PathBuf {
        resolve_threats_dir_from(
            self.threats_dir.clone(),
            &[
                PathBuf::from(LOCAL_THREATS_DIR),
                PathBuf::from(CONTAINER_THREATS_DIR),
            ],
        )
    }
}

/// Returns the path to the config file.
/// Uses $XDG_CONFIG_HOME/package-scan/config.json if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/package-scan/config.json,
/// or ./package-scan/config.json if neither is available.
pub fn config_path() -> PathBuf {
    config_dir_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
        .join("config.json")
}

fn config_dir_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("package-scan")
}

// Falls back to the first candidate so error messages name a sensible path.
fn resolve_threats_dir_from(explicit: Option<PathBuf>, candidates: &[PathBuf]) -> PathBuf {
    explicit
        .or_else(|| candidates.iter().find(|dir| dir.is_dir()).cloned())
        .or_else(|| candidates.first().cloned())
        .unwrap_or_else(|| PathBuf::from(LOCAL_THREATS_DIR))
}
