use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::events::{LogStorageEventSink, StorageEvent, StorageEventSink, StorageFailure};
use super::local_store::LocalStore;
use super::storage_traits::{LocalStoreBackend, RemoteStoreTrait};
use crate::contacts::Contact;
use crate::deals::Deal;
use crate::entities::{Entity, EntityKind};
use crate::errors::{Error, Result};

pub const DEFAULT_LOCAL_LATENCY: Duration = Duration::from_millis(500);
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timing knobs for the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Delay applied to every local-only read and write. Zero disables it.
    pub local_latency: Duration,
    /// Deadline for each remote call.
    pub remote_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_latency: DEFAULT_LOCAL_LATENCY,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

impl StorageConfig {
    /// No artificial latency. Used by tests and batch tools.
    pub fn immediate() -> Self {
        Self {
            local_latency: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Remote,
}

/// Single read/write contract per entity kind.
///
/// Reads prefer the remote store when one is configured and fall back to the
/// local store on any failure. Writes always land locally first; remote
/// propagation is best-effort and never fails the caller.
pub struct StorageFacade {
    local: LocalStore,
    remote: Option<Arc<dyn RemoteStoreTrait>>,
    config: StorageConfig,
    event_sink: Arc<dyn StorageEventSink>,
}

impl StorageFacade {
    pub fn new(
        local_backend: Arc<dyn LocalStoreBackend>,
        remote: Option<Arc<dyn RemoteStoreTrait>>,
        config: StorageConfig,
    ) -> Self {
        let event_sink: Arc<dyn StorageEventSink> = Arc::new(LogStorageEventSink);
        match &remote {
            Some(_) => info!("Storage facade running against the remote store"),
            None => info!("No remote store configured, running in local-only mode"),
        }
        Self {
            local: LocalStore::new(local_backend, Arc::clone(&event_sink)),
            remote,
            config,
            event_sink,
        }
    }

    /// Sets the sink receiving absorbed storage failures.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn StorageEventSink>) -> Self {
        self.local.set_event_sink(Arc::clone(&event_sink));
        self.event_sink = event_sink;
        self
    }

    pub fn mode(&self) -> StorageMode {
        if self.remote.is_some() {
            StorageMode::Remote
        } else {
            StorageMode::Local
        }
    }

    pub fn config(&self) -> StorageConfig {
        self.config
    }

    /// Current collection for `T`. Never fails.
    pub async fn load<T: Entity>(&self) -> Vec<T> {
        match &self.remote {
            Some(remote) => match self.fetch_remote::<T>(remote.as_ref()).await {
                Ok(items) => {
                    debug!("Loaded {} {} from remote store", items.len(), T::KIND);
                    return items;
                }
                Err((failure, err)) => {
                    self.report(T::KIND, failure, &err);
                    info!("Falling back to local store for {}", T::KIND);
                }
            },
            None => self.local_latency().await,
        }
        self.local.read::<T>().await
    }

    /// Replaces the whole collection for `T`.
    pub async fn save<T: Entity>(&self, items: &[T]) -> Result<()> {
        self.local_latency().await;
        self.local.write(items).await?;

        if let Some(remote) = &self.remote {
            let rows = items
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<Vec<_>>>();
            match rows {
                Ok(rows) => {
                    self.propagate(T::KIND, remote.upsert_rows(T::KIND, rows))
                        .await
                }
                Err(err) => self.report(T::KIND, StorageFailure::RemoteWrite, &err.into()),
            }
        }
        Ok(())
    }

    /// Inserts or replaces one entity by id.
    pub async fn upsert<T: Entity>(&self, item: &T) -> Result<()> {
        self.local_latency().await;
        self.local.upsert(item).await?;

        if let Some(remote) = &self.remote {
            match serde_json::to_value(item) {
                Ok(row) => {
                    self.propagate(T::KIND, remote.upsert_rows(T::KIND, vec![row]))
                        .await
                }
                Err(err) => self.report(T::KIND, StorageFailure::RemoteWrite, &err.into()),
            }
        }
        Ok(())
    }

    /// Removes one entity by id. Unknown ids are a no-op.
    pub async fn delete<T: Entity>(&self, id: &str) -> Result<()> {
        self.local_latency().await;
        self.local.remove::<T>(id).await?;

        if let Some(remote) = &self.remote {
            self.propagate(T::KIND, remote.delete_row(T::KIND, id))
                .await;
        }
        Ok(())
    }

    pub async fn load_contacts(&self) -> Vec<Contact> {
        self.load().await
    }

    pub async fn save_contacts(&self, contacts: &[Contact]) -> Result<()> {
        self.save(contacts).await
    }

    pub async fn load_deals(&self) -> Vec<Deal> {
        self.load().await
    }

    pub async fn save_deals(&self, deals: &[Deal]) -> Result<()> {
        self.save(deals).await
    }

    async fn fetch_remote<T: Entity>(
        &self,
        remote: &dyn RemoteStoreTrait,
    ) -> std::result::Result<Vec<T>, (StorageFailure, Error)> {
        let rows = self
            .with_deadline(remote.fetch_all(T::KIND))
            .await
            .map_err(|err| (StorageFailure::RemoteFetch, err))?;
        serde_json::from_value(serde_json::Value::Array(rows))
            .map_err(|err| (StorageFailure::RemoteDecode, err.into()))
    }

    async fn propagate<F>(&self, kind: EntityKind, call: F)
    where
        F: Future<Output = Result<()>>,
    {
        if let Err(err) = self.with_deadline(call).await {
            self.report(kind, StorageFailure::RemoteWrite, &err);
        }
    }

    async fn with_deadline<F, R>(&self, call: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        match tokio::time::timeout(self.config.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::RemoteTimeout(self.config.remote_timeout)),
        }
    }

    async fn local_latency(&self) {
        if self.remote.is_none() && !self.config.local_latency.is_zero() {
            tokio::time::sleep(self.config.local_latency).await;
        }
    }

    fn report(&self, kind: EntityKind, failure: StorageFailure, err: &Error) {
        self.event_sink
            .emit(StorageEvent::new(kind, failure, err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deals::DealStage;
    use crate::storage::events::RecordingStorageEventSink;
    use crate::storage::memory::MemoryLocalStore;

    fn local_only(latency: Duration) -> StorageFacade {
        StorageFacade::new(
            Arc::new(MemoryLocalStore::new()),
            None,
            StorageConfig {
                local_latency: latency,
                ..StorageConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn empty_store_loads_seed_deals() {
        let facade = local_only(Duration::ZERO);
        let stages: Vec<DealStage> = facade.load_deals().await.iter().map(|d| d.stage).collect();
        assert_eq!(
            stages,
            vec![
                DealStage::Negotiation,
                DealStage::Proposal,
                DealStage::ClosedWon,
                DealStage::Lead
            ]
        );
        assert_eq!(facade.mode(), StorageMode::Local);
    }

    #[tokio::test]
    async fn save_then_load_round_trips_locally() {
        let facade = local_only(Duration::ZERO);
        let mut deals = Deal::seed();
        deals.truncate(2);
        deals[0].stage = DealStage::ClosedLost;

        facade.save_deals(&deals).await.unwrap();
        assert_eq!(facade.load_deals().await, deals);
    }

    #[tokio::test(start_paused = true)]
    async fn local_only_calls_wait_for_configured_latency() {
        let facade = local_only(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        let _ = facade.load_contacts().await;
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn local_only_writes_wait_for_configured_latency() {
        let latency = Duration::from_millis(500);
        let facade = local_only(latency);
        let deals = Deal::seed();

        let started = tokio::time::Instant::now();
        facade.save_deals(&deals).await.unwrap();
        assert!(started.elapsed() >= latency);

        let started = tokio::time::Instant::now();
        facade
            .upsert(&deals[0].with_stage(DealStage::Lead))
            .await
            .unwrap();
        assert!(started.elapsed() >= latency);

        let started = tokio::time::Instant::now();
        facade.delete::<Deal>("d4").await.unwrap();
        assert!(started.elapsed() >= latency);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_latency_does_not_wait() {
        let facade = local_only(Duration::ZERO);
        let started = tokio::time::Instant::now();
        let deals = facade.load_deals().await;
        facade.save_deals(&deals).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn write_failure_is_returned_and_reported() {
        struct BrokenBackend;

        #[async_trait::async_trait]
        impl LocalStoreBackend for BrokenBackend {
            async fn get(&self, _key: &str) -> Result<Option<String>> {
                Ok(None)
            }
            async fn put(&self, _key: &str, _payload: String) -> Result<()> {
                Err(Error::Database(crate::errors::DatabaseError::Unavailable(
                    "disk full".to_string(),
                )))
            }
            async fn update(
                &self,
                key: &str,
                _apply: crate::storage::storage_traits::PayloadUpdate,
            ) -> Result<()> {
                self.put(key, String::new()).await
            }
        }

        let sink = Arc::new(RecordingStorageEventSink::new());
        let facade = StorageFacade::new(Arc::new(BrokenBackend), None, StorageConfig::immediate())
            .with_event_sink(sink.clone());

        assert!(facade.save_contacts(&Contact::seed()).await.is_err());
        assert_eq!(sink.failures(), vec![StorageFailure::LocalWrite]);
    }
}
