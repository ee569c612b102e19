//! # Storage Module
//!
//! Persistence for ledger transactions. The domain layer only sees the
//! [`TransactionStorage`] and [`Connection`] traits; the in-memory backend in
//! [`memory`] is the one shipped with the service.
//!
//! Nothing is written to disk: the store lives for the lifetime of the
//! process and is owned by the composition root, which hands connections to
//! the services that need them.

pub mod traits;
pub mod memory;

pub use traits::{Connection, StorageError, TransactionStorage};
pub use memory::{MemoryConnection, TransactionRepository};
