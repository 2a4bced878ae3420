//! Persistence seams: local and remote backends, the facade that selects
//! between them, and the sink for failures they absorb.

mod events;
mod facade;
mod local_store;
mod memory;
mod storage_traits;

pub use events::*;
pub use facade::*;
pub use local_store::LocalStore;
pub use memory::MemoryLocalStore;
pub use storage_traits::*;
