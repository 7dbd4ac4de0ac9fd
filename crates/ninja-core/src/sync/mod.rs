//! Roster synchronization with the remote document
//!
//! ## Protocol
//!
//! 1. On startup, read the latest document once and replace the roster
//! 2. Every mutation bumps a generation and queues a full snapshot
//! 3. A single background task writes snapshots one at a time, keeping
//!    only the newest when several are waiting
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SyncEngine::new(Arc::new(JsonBinClient::new(&remote)?));
//! engine.load().await?;
//! engine.add_bucks(0, 5)?;
//! engine.flush().await?;
//! ```

mod engine;
mod queue;

pub use engine::{LoadState, SyncEngine};
pub use queue::{QueueStatus, SaveEvent};
