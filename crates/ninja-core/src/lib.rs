//! Ninja Bucks Core Library
//!
//! This crate provides the core functionality for Ninja Bucks, a small
//! client that tracks ninjas and their ninja bucks in a hosted JSON
//! document.
//!
//! # Architecture
//!
//! - **Remote document**: source of truth between sessions, read and
//!   written whole
//! - **Roster**: in-memory list, source of truth while running
//! - **Sync engine**: one read on load, one queued write per mutation
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = JsonBinClient::new(&config.require_remote()?)?;
//! let mut engine = SyncEngine::new(Arc::new(store));
//!
//! engine.load().await?;
//! engine.append_entity("kai", 10)?;
//! engine.flush().await?;
//! ```
//!
//! # Modules
//!
//! - `sync`: Sync engine and save queue (main entry point)
//! - `roster`: In-memory ninja list and input validation
//! - `models`: Ninja and remote document shapes
//! - `remote`: Document store trait, JSONBin client, in-memory store
//! - `config`: Application configuration
//! - `error`: Error types

pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod roster;
pub mod sync;

pub use config::{Config, RemoteConfig};
pub use error::{RemoteError, SyncError, SyncResult, ValidationError};
pub use models::{total_bucks, Ninja, NinjaDocument};
pub use remote::{DocumentStore, JsonBinClient, MemoryStore};
pub use roster::Roster;
pub use sync::{LoadState, SaveEvent, SyncEngine};
