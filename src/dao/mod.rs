//! Persistence boundary: entities, the store trait, and its backends.

pub mod memory;
pub mod models;
pub mod storage;
pub mod store;

#[cfg(feature = "mongo-store")]
pub mod mongodb;
