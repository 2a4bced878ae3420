//! Database model for the key→payload table.

use diesel::prelude::*;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(primary_key(key))]
#[diesel(table_name = crate::schema::local_store)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LocalStoreEntryDB {
    pub key: String,
    /// JSON array of the collection stored under `key`.
    pub payload: String,
    pub updated_at: String,
}

impl LocalStoreEntryDB {
    pub fn new(key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
