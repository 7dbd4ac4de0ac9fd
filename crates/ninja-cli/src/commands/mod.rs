//! Command handlers

pub mod config;
pub mod ninja;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};

use ninja_core::{Config, JsonBinClient, SyncEngine, SyncError};

/// Build a sync engine talking to the configured bin
pub fn open_engine(config: &Config) -> Result<SyncEngine> {
    let remote = config.require_remote()?;
    let client = JsonBinClient::new(&remote).context("Failed to create HTTP client")?;
    Ok(SyncEngine::new(Arc::new(client)))
}

/// Attach the recovery suggestion (if any) to a sync error
pub fn explain(error: SyncError) -> anyhow::Error {
    let suggestion = error.remote().and_then(|e| e.recovery_suggestion());
    match suggestion {
        Some(hint) => anyhow::anyhow!("{}\n  {}", error, hint),
        None => error.into(),
    }
}
