//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use ninja_core::config::mask_secret;
use ninja_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let master_key = config.master_key.as_deref().map(mask_secret);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "api_url": config.api_url,
                    "bin_id": config.bin_id,
                    "master_key": master_key,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_file": config.log_path()
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(url) = config.bin_url() {
                println!("{}", url);
            }
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  api_url:              {}", config.api_url);
            println!(
                "  bin_id:               {}",
                config.bin_id.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  master_key:           {}",
                master_key.as_deref().unwrap_or("(not set)")
            );
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!("  log_file:             {}", config.log_path().display());
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
///
/// Only the file layer is read and written back, so overrides coming from
/// `NINJABUCKS_*` variables never end up on disk.
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    let mut config = Config::load_file_only(&save_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "master_key" {
        mask_secret(&value)
    } else {
        value
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "api_url" => {
            if value.is_empty() {
                bail!("api_url cannot be empty");
            }
            config.api_url = value.to_string();
        }
        "bin_id" => {
            config.bin_id = optional(value);
        }
        "master_key" => {
            config.master_key = optional(value);
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = value
                .parse()
                .context("Invalid value for request_timeout_secs. Use a whole number of seconds.")?;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: api_url, bin_id, master_key, request_timeout_secs, log_file",
                key
            );
        }
    }
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MASTER_KEY_VAR: &str = "NINJABUCKS_MASTER_KEY";

    /// Sets the master key variable for one test and restores it on drop
    struct MasterKeyEnv<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Option<String>,
    }

    impl MasterKeyEnv<'_> {
        fn set(value: &str) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = env::var(MASTER_KEY_VAR).ok();
            env::set_var(MASTER_KEY_VAR, value);
            Self { _lock: lock, saved }
        }
    }

    impl Drop for MasterKeyEnv<'_> {
        fn drop(&mut self) {
            match &self.saved {
                Some(v) => env::set_var(MASTER_KEY_VAR, v),
                None => env::remove_var(MASTER_KEY_VAR),
            }
        }
    }

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "bin_id", "abc").unwrap();
        apply(&mut config, "master_key", "secret").unwrap();
        apply(&mut config, "request_timeout_secs", "5").unwrap();

        assert_eq!(config.bin_id, Some("abc".to_string()));
        assert_eq!(config.master_key, Some("secret".to_string()));
        assert_eq!(config.request_timeout_secs, 5);

        apply(&mut config, "bin_id", "none").unwrap();
        assert!(config.bin_id.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "request_timeout_secs", "soon").is_err());
        assert!(apply(&mut config, "api_url", "").is_err());

        let err = apply(&mut config, "color", "red").unwrap_err().to_string();
        assert!(err.contains("Unknown configuration key"));
    }

    #[test]
    fn test_set_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set("bin_id".to_string(), "abc".to_string(), Some(&path), &output).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("bin_id = \"abc\""));
    }

    #[test]
    fn test_set_keeps_env_master_key_out_of_file() {
        let _env = MasterKeyEnv::set("env-only-secret");
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set("bin_id".to_string(), "abc".to_string(), Some(&path), &output).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("bin_id = \"abc\""));
        assert!(!content.contains("env-only-secret"));
        assert!(Config::load_file_only(&path).unwrap().master_key.is_none());
    }
}
