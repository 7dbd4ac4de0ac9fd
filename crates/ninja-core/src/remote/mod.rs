//! Remote document store
//!
//! The roster lives in one hosted JSON document. The store only supports
//! whole-document operations:
//!
//! - read the latest version
//! - overwrite the document entirely
//!
//! There is no versioning and no history; the last write wins.
//!
//! ## Implementations
//!
//! - `JsonBinClient`: JSONBin v3 over HTTPS (reqwest)
//! - `MemoryStore`: in-process document, used in tests

mod jsonbin;
mod memory;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::NinjaDocument;

pub use jsonbin::JsonBinClient;
pub use memory::MemoryStore;

/// A whole-document key-value store holding the roster
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the latest version of the document
    async fn fetch_latest(&self) -> Result<NinjaDocument, RemoteError>;

    /// Replace the stored document with `document`
    async fn overwrite(&self, document: &NinjaDocument) -> Result<(), RemoteError>;
}
