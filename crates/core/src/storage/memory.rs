use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::storage_traits::{LocalStoreBackend, PayloadUpdate};
use crate::errors::{DatabaseError, Error, Result};

/// In-process backend. Nothing survives the process; used for ephemeral
/// sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates `key` with a raw payload, valid JSON or not.
    pub fn with_payload(self, key: &str, payload: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), payload.into());
        }
        self
    }

    fn poisoned() -> Error {
        Error::Database(DatabaseError::Internal(
            "Memory store lock is poisoned".to_string(),
        ))
    }
}

#[async_trait]
impl LocalStoreBackend for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, payload: String) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), payload);
        Ok(())
    }

    async fn update(&self, key: &str, apply: PayloadUpdate) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        let next = apply(entries.get(key).cloned())?;
        entries.insert(key.to_string(), next);
        Ok(())
    }
}
