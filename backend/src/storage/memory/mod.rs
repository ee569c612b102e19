//! # In-Memory Storage
//!
//! A single map of transactions keyed by ID, plus the next ID to hand out,
//! behind one reader/writer lock. Reads take the read lock, writes the write
//! lock, and no operation holds the lock while acquiring it again.

pub mod connection;
pub mod transaction_repository;

pub use connection::MemoryConnection;
pub use transaction_repository::TransactionRepository;
