//! Entity kinds managed by the storage layer and the contract every stored record satisfies.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Local keyspace: one namespaced key per entity kind.
pub const LOCAL_STORE_KEYS: [&str; 2] = ["bora_crm_contacts_v1", "bora_crm_deals_v1"];

/// Remote collection (table) names, in the same order as [`LOCAL_STORE_KEYS`].
pub const REMOTE_TABLES: [&str; 2] = ["contacts", "deals"];

/// The two managed record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Contacts,
    Deals,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Contacts, EntityKind::Deals];

    fn index(self) -> usize {
        match self {
            EntityKind::Contacts => 0,
            EntityKind::Deals => 1,
        }
    }

    /// Key of this kind's collection in the durable local store.
    pub fn storage_key(self) -> &'static str {
        LOCAL_STORE_KEYS[self.index()]
    }

    /// Table holding this kind's rows in the remote store.
    pub fn table_name(self) -> &'static str {
        REMOTE_TABLES[self.index()]
    }

    pub fn as_str(self) -> &'static str {
        self.table_name()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can be persisted by the storage facade.
///
/// Collections are JSON arrays of `Self`; the identifier is what keyed
/// upserts and deletes address.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Checks the record's invariants before it is accepted as a change.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Built-in records returned when nothing has been persisted yet.
    fn seed() -> Vec<Self>;
}
