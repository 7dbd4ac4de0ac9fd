//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/ninjabucks/config.toml)
//! 3. Environment variables (NINJABUCKS_* prefix)
//!
//! Environment variables take precedence over config file values. The bin
//! id and master key are never hard-coded; they have to come from one of
//! the two outer layers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "NINJABUCKS";

/// Default JSONBin v3 bins endpoint
pub const DEFAULT_API_URL: &str = "https://api.jsonbin.io/v3/b";

/// Default HTTP request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the bins endpoint (without the bin id)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Identifier of the bin holding the roster
    #[serde(default)]
    pub bin_id: Option<String>,

    /// Secret sent as `X-Master-Key`
    #[serde(default)]
    pub master_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log file for the TUI (defaults to the data directory)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Everything needed to talk to the remote bin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// `{api_url}/{bin_id}`
    pub bin_url: String,
    pub master_key: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            bin_id: None,
            master_key: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::load_file_only(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the file layer alone, without environment overrides
    ///
    /// Use this before writing the file back, so values that only came
    /// from the environment are never persisted.
    pub fn load_file_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_API_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.api_url = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_BIN_ID", ENV_PREFIX)) {
            self.bin_id = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_MASTER_KEY", ENV_PREFIX)) {
            self.master_key = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = non_empty(val).map(PathBuf::from);
        }
    }

    /// URL of the configured bin, if a bin id is set
    ///
    /// This is the only place the store address is assembled; both the read
    /// (`{bin_url}/latest`) and the write (`{bin_url}`) derive from it.
    pub fn bin_url(&self) -> Option<String> {
        let bin_id = self.bin_id.as_deref()?.trim_matches('/');
        Some(format!("{}/{}", self.api_url.trim_end_matches('/'), bin_id))
    }

    /// Remote settings, failing with a readable message if incomplete
    pub fn require_remote(&self) -> Result<RemoteConfig> {
        let Some(bin_url) = self.bin_url() else {
            bail!(
                "Bin id not configured. Set it with:\n  \
                 ninjabucks config set bin_id <id>\n  \
                 or export {}_BIN_ID",
                ENV_PREFIX
            );
        };

        let Some(ref master_key) = self.master_key else {
            bail!(
                "Master key not configured. Set it with:\n  \
                 ninjabucks config set master_key <key>\n  \
                 or export {}_MASTER_KEY",
                ENV_PREFIX
            );
        };

        Ok(RemoteConfig {
            bin_url,
            master_key: master_key.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with NINJABUCKS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ninjabucks")
            .join("config.toml")
    }

    /// Where TUI logs go
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("ninjabucks.log"))
    }
}

/// Master key with everything but the last four characters hidden
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ninjabucks")
}
