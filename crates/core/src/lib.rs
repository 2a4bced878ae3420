//! Domain model and persistence layer of the Bora CRM client.
//!
//! Contacts and deals live in a durable local store, optionally mirrored to a
//! hosted remote store. [`storage::StorageFacade`] hides which backend serves
//! a request and [`optimistic::OptimisticCollection`] applies user changes in
//! memory before they are persisted.

pub mod config;
pub mod contacts;
pub mod deals;
pub mod entities;
pub mod errors;
pub mod optimistic;
pub mod seed;
pub mod storage;

pub use config::{AppConfig, RemoteConfig};
pub use entities::{Entity, EntityKind};
pub use errors::{Error, Result};
