//! Typed view over a [`LocalStoreBackend`]: JSON decoding, seed fallback and
//! keyed mutations.

use std::sync::Arc;

use log::debug;

use super::events::{StorageEvent, StorageEventSink, StorageFailure};
use super::storage_traits::LocalStoreBackend;
use crate::entities::{Entity, EntityKind};
use crate::errors::Result;

pub struct LocalStore {
    backend: Arc<dyn LocalStoreBackend>,
    sink: Arc<dyn StorageEventSink>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn LocalStoreBackend>, sink: Arc<dyn StorageEventSink>) -> Self {
        Self { backend, sink }
    }

    pub(crate) fn set_event_sink(&mut self, sink: Arc<dyn StorageEventSink>) {
        self.sink = sink;
    }

    /// Stored collection for `T`, or its seed when absent, unreadable or corrupt.
    ///
    /// Never fails; unreadable and corrupt payloads are reported to the sink.
    pub async fn read<T: Entity>(&self) -> Vec<T> {
        let key = T::KIND.storage_key();
        match self.backend.get(key).await {
            Ok(Some(payload)) => match decode_collection::<T>(&payload) {
                Ok(items) => items,
                Err(err) => {
                    self.report(T::KIND, StorageFailure::LocalDecode, err.to_string());
                    T::seed()
                }
            },
            Ok(None) => {
                debug!("No stored {} yet, serving seed dataset", T::KIND);
                T::seed()
            }
            Err(err) => {
                self.report(T::KIND, StorageFailure::LocalRead, err.to_string());
                T::seed()
            }
        }
    }

    /// Replaces the whole collection for `T`.
    pub async fn write<T: Entity>(&self, items: &[T]) -> Result<()> {
        let result = match serde_json::to_string(items) {
            Ok(payload) => self.backend.put(T::KIND.storage_key(), payload).await,
            Err(err) => Err(err.into()),
        };
        self.report_write::<T>(result)
    }

    /// Replaces the entity with the same id in place, or appends it.
    ///
    /// Fails without touching the stored payload when it cannot be decoded;
    /// a whole-collection [`write`](Self::write) replaces it.
    pub async fn upsert<T: Entity>(&self, item: &T) -> Result<()> {
        let item = item.clone();
        let sink = Arc::clone(&self.sink);
        let result = self
            .backend
            .update(
                T::KIND.storage_key(),
                Box::new(move |current| {
                    let mut items = base_collection::<T>(current, sink.as_ref())?;
                    match items.iter_mut().find(|existing| existing.id() == item.id()) {
                        Some(existing) => *existing = item,
                        None => items.push(item),
                    }
                    Ok(serde_json::to_string(&items)?)
                }),
            )
            .await;
        self.report_write::<T>(result)
    }

    /// Removes the entity with `id`. Removing an unknown id is a no-op.
    pub async fn remove<T: Entity>(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        let sink = Arc::clone(&self.sink);
        let result = self
            .backend
            .update(
                T::KIND.storage_key(),
                Box::new(move |current| {
                    let mut items = base_collection::<T>(current, sink.as_ref())?;
                    items.retain(|existing| existing.id() != id);
                    Ok(serde_json::to_string(&items)?)
                }),
            )
            .await;
        self.report_write::<T>(result)
    }

    fn report_write<T: Entity>(&self, result: Result<()>) -> Result<()> {
        if let Err(err) = &result {
            self.report(T::KIND, StorageFailure::LocalWrite, err.to_string());
        }
        result
    }

    fn report(&self, kind: EntityKind, failure: StorageFailure, message: String) {
        self.sink.emit(StorageEvent::new(kind, failure, message));
    }
}

pub(crate) fn decode_collection<T: Entity>(payload: &str) -> serde_json::Result<Vec<T>> {
    serde_json::from_str(payload)
}

/// Collection a keyed mutation starts from. An absent key starts from the
/// seed; an undecodable payload fails the mutation and is left in place.
fn base_collection<T: Entity>(
    current: Option<String>,
    sink: &dyn StorageEventSink,
) -> Result<Vec<T>> {
    match current {
        Some(payload) => decode_collection::<T>(&payload).map_err(|err| {
            sink.emit(StorageEvent::new(
                T::KIND,
                StorageFailure::LocalDecode,
                err.to_string(),
            ));
            err.into()
        }),
        None => Ok(T::seed()),
    }
}
