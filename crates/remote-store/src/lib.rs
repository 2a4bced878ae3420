//! Hosted remote store for Bora CRM collections.

pub mod adapter;
pub mod client;
pub mod error;

pub use adapter::RemoteStoreAdapter;
pub use client::RemoteStoreClient;
pub use error::{RemoteStoreError, Result};
