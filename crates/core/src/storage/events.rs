//! Observability sink for failures the storage layer absorbs.
//!
//! Reads never fail and remote writes are best-effort, so these events are the
//! only trace of a degraded backend. Hosts plug in their own sink; the default
//! one forwards to `log`.

use std::sync::Mutex;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;

/// Where an absorbed failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFailure {
    LocalRead,
    LocalDecode,
    LocalWrite,
    RemoteFetch,
    RemoteDecode,
    RemoteWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    pub kind: EntityKind,
    pub failure: StorageFailure,
    pub message: String,
}

impl StorageEvent {
    pub fn new(kind: EntityKind, failure: StorageFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            failure,
            message: message.into(),
        }
    }
}

pub trait StorageEventSink: Send + Sync {
    fn emit(&self, event: StorageEvent);
}

/// Forwards every event to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStorageEventSink;

impl StorageEventSink for LogStorageEventSink {
    fn emit(&self, event: StorageEvent) {
        warn!(
            "[storage] {:?} failure for {}: {}",
            event.failure, event.kind, event.message
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpStorageEventSink;

impl StorageEventSink for NoOpStorageEventSink {
    fn emit(&self, _event: StorageEvent) {}
}

/// Keeps every event in memory. Useful for status panels and tests.
#[derive(Debug, Default)]
pub struct RecordingStorageEventSink {
    events: Mutex<Vec<StorageEvent>>,
}

impl RecordingStorageEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StorageEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<StorageFailure> {
        self.events().into_iter().map(|e| e.failure).collect()
    }
}

impl StorageEventSink for RecordingStorageEventSink {
    fn emit(&self, event: StorageEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingStorageEventSink::new();
        sink.emit(StorageEvent::new(
            EntityKind::Deals,
            StorageFailure::RemoteFetch,
            "503",
        ));
        sink.emit(StorageEvent::new(
            EntityKind::Deals,
            StorageFailure::LocalDecode,
            "eof",
        ));
        assert_eq!(
            sink.failures(),
            vec![StorageFailure::RemoteFetch, StorageFailure::LocalDecode]
        );
        assert_eq!(sink.events()[0].message, "503");
    }
}
