use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use boracrm_core::storage::{LocalStoreBackend, PayloadUpdate};
use boracrm_core::Result;

use super::model::LocalStoreEntryDB;
use crate::db::{self, get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::local_store;

/// Durable local store kept in the `local_store` table.
pub struct SqliteLocalStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteLocalStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteLocalStore { pool, writer }
    }

    /// Opens the database under `data_dir`, running pending migrations.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let (pool, writer) = db::open(data_dir)?;
        Ok(Self::new(pool, writer))
    }

    pub fn get_impl(&self, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(read_payload(&mut conn, key)?)
    }

    /// Stored keys, for diagnostics.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let keys = local_store::table
            .select(local_store::key)
            .order(local_store::key.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(keys)
    }
}

fn read_payload(
    conn: &mut SqliteConnection,
    key: &str,
) -> std::result::Result<Option<String>, StorageError> {
    Ok(local_store::table
        .find(key)
        .select(local_store::payload)
        .first::<String>(conn)
        .optional()?)
}

fn write_payload(conn: &mut SqliteConnection, key: &str, payload: String) -> Result<()> {
    let row = LocalStoreEntryDB::new(key, payload);
    diesel::insert_into(local_store::table)
        .values(&row)
        .on_conflict(local_store::key)
        .do_update()
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl LocalStoreBackend for SqliteLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_impl(key)
    }

    async fn put(&self, key: &str, payload: String) -> Result<()> {
        let key = key.to_string();
        debug!("Writing {} bytes under {}", payload.len(), key);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                write_payload(conn, &key, payload)
            })
            .await
    }

    async fn update(&self, key: &str, apply: PayloadUpdate) -> Result<()> {
        let key = key.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let current = read_payload(conn, &key)?;
                let next = apply(current)?;
                write_payload(conn, &key, next)
            })
            .await
    }
}
