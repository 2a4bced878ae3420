mod model;
mod repository;

pub use model::LocalStoreEntryDB;
pub use repository::SqliteLocalStore;
