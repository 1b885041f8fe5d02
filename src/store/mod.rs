//! Document store abstraction.
//!
//! The [`DocumentStore`] trait is the loader's only view of the destination
//! database. A store is an explicitly constructed handle: it is opened once,
//! passed to [`run_load`](crate::loader::run_load), and closed at the end of
//! the run.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`FirestoreStore`] | Cloud Firestore (or its emulator) over REST |
//! | [`InMemoryStore`] | Tests and local experiments |

pub mod credentials;
pub mod firestore;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

/// A keyed collection database.
///
/// Documents are JSON objects. Implementations must be `Send + Sync` so a
/// handle can be held across `.await` points.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short human-readable description of the target, for logs.
    fn describe(&self) -> String;

    /// Create or replace the document at `collection/id`.
    async fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<()>;

    /// Create a document with a store-assigned id and return that id.
    async fn append(&self, collection: &str, document: &Value) -> Result<String>;

    /// Release the handle. Further writes are not expected afterwards.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
