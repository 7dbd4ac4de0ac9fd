//! Status command handler

use anyhow::Result;

use ninja_core::config::mask_secret;
use ninja_core::{total_bucks, Config, SyncEngine};

use super::open_engine;
use crate::output::{format_total, Output, OutputFormat};

/// What a status check found on the remote side
enum RemoteState {
    NotConfigured(String),
    /// `total` is `None` when the balances overflow an i64
    Reachable { ninjas: usize, total: Option<i64> },
    Unreachable(String),
}

/// Show configuration and remote bin status
pub async fn show(config: &Config, output: &Output) -> Result<()> {
    let state = match open_engine(config) {
        Ok(mut engine) => check_remote(&mut engine).await,
        Err(e) => RemoteState::NotConfigured(e.to_string()),
    };

    let bin_url = config.bin_url();
    let master_key = config.master_key.as_deref().map(mask_secret);

    match output.format {
        OutputFormat::Json => {
            let remote = match &state {
                RemoteState::NotConfigured(reason) => {
                    serde_json::json!({"state": "not_configured", "reason": reason})
                }
                RemoteState::Reachable { ninjas, total } => {
                    serde_json::json!({"state": "reachable", "ninjas": ninjas, "total_bucks": total})
                }
                RemoteState::Unreachable(error) => {
                    serde_json::json!({"state": "unreachable", "error": error})
                }
            };
            println!(
                "{}",
                serde_json::json!({
                    "bin_url": bin_url,
                    "master_key": master_key,
                    "remote": remote
                })
            );
        }
        OutputFormat::Quiet => {
            let word = match state {
                RemoteState::NotConfigured(_) => "not-configured",
                RemoteState::Reachable { .. } => "ok",
                RemoteState::Unreachable(_) => "unreachable",
            };
            println!("{}", word);
        }
        OutputFormat::Human => {
            println!("Ninja Bucks Status");
            println!("==================");
            println!();
            println!("Remote bin:");
            println!(
                "  URL:        {}",
                bin_url.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  Master key: {}",
                master_key.as_deref().unwrap_or("(not set)")
            );
            println!();
            match state {
                RemoteState::NotConfigured(reason) => {
                    println!("Not configured:");
                    for line in reason.lines() {
                        println!("  {}", line.trim());
                    }
                }
                RemoteState::Reachable { ninjas, total } => {
                    println!("Contents:");
                    println!("  Ninjas:      {}", ninjas);
                    println!("  Ninja bucks: {}", format_total(total));
                }
                RemoteState::Unreachable(error) => {
                    println!("Unreachable:");
                    println!("  {}", error);
                }
            }
        }
    }

    Ok(())
}

async fn check_remote(engine: &mut SyncEngine) -> RemoteState {
    match engine.load().await {
        Ok(count) => RemoteState::Reachable {
            ninjas: count,
            total: total_bucks(engine.ninjas()),
        },
        Err(e) => RemoteState::Unreachable(e.to_string()),
    }
}
