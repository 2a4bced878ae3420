use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

use boracrm_core::storage::RemoteStoreTrait;
use boracrm_core::{EntityKind, RemoteConfig, Result};

use crate::client::RemoteStoreClient;

/// [`RemoteStoreTrait`] over the REST client, one table per entity kind.
#[derive(Debug, Clone)]
pub struct RemoteStoreAdapter {
    client: RemoteStoreClient,
}

impl RemoteStoreAdapter {
    pub fn new(client: RemoteStoreClient) -> Self {
        Self { client }
    }

    /// Adapter for `config`, or `None` when the remote store is not configured
    /// or its configuration is unusable.
    pub fn from_config(config: Option<&RemoteConfig>) -> Option<Self> {
        let config = config?;
        match RemoteStoreClient::new(&config.endpoint, &config.credential) {
            Ok(client) => {
                info!("Remote store enabled at {}", client.base_url());
                Some(Self::new(client))
            }
            Err(err) => {
                warn!("Remote store disabled: {}", err);
                None
            }
        }
    }
}

#[async_trait]
impl RemoteStoreTrait for RemoteStoreAdapter {
    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Value>> {
        Ok(self.client.select_all(kind.table_name()).await?)
    }

    async fn upsert_rows(&self, kind: EntityKind, rows: Vec<Value>) -> Result<()> {
        Ok(self.client.upsert_rows(kind.table_name(), &rows).await?)
    }

    async fn delete_row(&self, kind: EntityKind, id: &str) -> Result<()> {
        Ok(self.client.delete_row(kind.table_name(), id).await?)
    }
}
