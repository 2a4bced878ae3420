//! Backend contracts composed by the storage facade.

use async_trait::async_trait;

use crate::entities::EntityKind;
use crate::errors::Result;

/// Read-modify-write step run atomically by a backend against the current payload.
///
/// Receives the stored payload (`None` when the key is absent) and returns the
/// payload to store in its place.
pub type PayloadUpdate = Box<dyn FnOnce(Option<String>) -> Result<String> + Send>;

/// Durable key→payload storage on the client device.
///
/// Payloads are opaque JSON text; decoding and seed fallback happen in
/// [`LocalStore`](super::LocalStore) so every backend behaves the same.
#[async_trait]
pub trait LocalStoreBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the payload stored under `key`. No partial write is observable.
    async fn put(&self, key: &str, payload: String) -> Result<()>;

    /// Runs `apply` against the current payload and stores its result, with no
    /// other write to `key` interleaving.
    async fn update(&self, key: &str, apply: PayloadUpdate) -> Result<()>;
}

/// Hosted relational backend mirroring the entity collections as rows.
#[async_trait]
pub trait RemoteStoreTrait: Send + Sync {
    /// All rows of the kind's table. Either the full collection or an error.
    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<serde_json::Value>>;

    /// Inserts or replaces rows by primary key.
    async fn upsert_rows(&self, kind: EntityKind, rows: Vec<serde_json::Value>) -> Result<()>;

    async fn delete_row(&self, kind: EntityKind, id: &str) -> Result<()>;
}
