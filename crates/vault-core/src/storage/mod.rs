//! Storage backends for accounts and secret records
//!
//! This module provides two interchangeable backends:
//! 1. In-memory maps guarded by a read/write lock
//! 2. SQLite (persistent, engine-enforced key constraints)

mod memory;
mod sqlite;
mod traits;

pub use memory::{MemoryAccountStore, MemoryStore};
pub use sqlite::SqliteStore;
pub use traits::{AccountStore, SecretStore};
