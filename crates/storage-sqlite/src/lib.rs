//! SQLite implementation of the Bora CRM durable local store.

pub mod db;
pub mod errors;
pub mod local_store;
pub mod schema;

pub use db::{create_pool, get_connection, init, open, run_migrations, spawn_writer, DbPool, WriteHandle};
pub use errors::StorageError;
pub use local_store::SqliteLocalStore;
