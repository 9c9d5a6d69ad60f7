//! Runtime configuration loaded from `~/.continuum/config.toml`.
//!
//! Every field has a default, so a missing file (or a file that only sets
//! one value) is fine. A file that exists but does not parse is an error:
//! silently ignoring a typo in the scan allow-list would be confusing.

use crate::error::{ContinuumError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_MEMORY_FILE: &str = ".claude-memory.json";
pub const DEFAULT_STATE_FILE: &str = ".continuum-state.json";
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

/// What the change scanner looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds between ticks in `watch` mode
    pub interval_secs: u64,
    /// File extensions (without the dot) that are fingerprinted
    pub extensions: Vec<String>,
    /// Exact file names that are fingerprinted regardless of extension
    pub manifests: Vec<String>,
    /// Directory names that are never descended into
    pub exclude_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            extensions: to_strings(&[
                "py", "js", "ts", "tsx", "jsx", "sol", "go", "rs", "java", "cpp",
            ]),
            manifests: to_strings(&["package.json", "requirements.txt", "Cargo.toml", "go.mod"]),
            exclude_dirs: to_strings(&[".git", ".hg", ".svn", "node_modules"]),
        }
    }
}

/// Extended-session heartbeat thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub heartbeat_minutes: u64,
    pub min_tracked_files: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_minutes: 30,
            min_tracked_files: 10,
        }
    }
}

impl SessionConfig {
    pub fn heartbeat_after(&self) -> Duration {
        Duration::from_secs(self.heartbeat_minutes.saturating_mul(60))
    }
}

/// File names of the two persisted documents, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub memory_file: String,
    pub state_file: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            memory_file: DEFAULT_MEMORY_FILE.to_string(),
            state_file: DEFAULT_STATE_FILE.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }

        let content = fs_err::read_to_string(&config_path).map_err(|e| ContinuumError::Io {
            context: format!("Failed to read config {}", config_path.display()),
            source: e,
        })?;
        Self::parse(&content).map_err(|details| ContinuumError::ConfigMalformed {
            path: config_path,
            details,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str::<Config>(content).map_err(|e| e.to_string())
    }
}

/// Returns the Continuum data directory (`~/.continuum`).
pub fn continuum_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".continuum"))
        .ok_or(ContinuumError::HomeDirNotFound)
}

pub fn default_config_path() -> Result<PathBuf> {
    continuum_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
