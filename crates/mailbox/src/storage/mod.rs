//! Storage traits and implementations
//!
//! This module defines the storage abstraction layer for mailbox
//! associations. The trait-based design allows swapping between in-memory
//! and SQLite storage implementations.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryEmailUserStore;
pub use sqlite::SqliteEmailUserStore;
pub use traits::EmailUserStore;
