//! # Storage Traits
//!
//! Storage abstraction used by the domain services, so the store can be
//! swapped (or faked in tests) without touching business logic.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::models::Transaction;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("transaction store lock poisoned")]
    LockPoisoned,
    #[error("transaction id {0} leaves no room for further ids")]
    IdSpaceExhausted(i64),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Trait defining the interface for transaction storage operations
pub trait TransactionStorage: Send + Sync {
    /// Store a transaction, assigning the next free ID when `transaction.id == 0`.
    /// An existing transaction with the same ID is overwritten.
    /// Returns the transaction as stored.
    fn save_transaction(&self, transaction: Transaction) -> StorageResult<Transaction>;

    /// Retrieve a specific transaction by ID
    fn get_transaction(&self, id: i64) -> StorageResult<Option<Transaction>>;

    /// List a user's transactions, optionally bounded by date.
    /// Both bounds are inclusive and independent of each other.
    /// Returns transactions ordered by date ascending, then by ID.
    fn list_transactions_by_user(
        &self,
        user_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StorageResult<Vec<Transaction>>;

    /// List every stored transaction ordered by ID
    fn list_all_transactions(&self) -> StorageResult<Vec<Transaction>>;

    /// Number of stored transactions
    fn count_transactions(&self) -> StorageResult<usize>;

    /// Remove everything and reset ID assignment
    fn clear_transactions(&self) -> StorageResult<()>;
}

/// Trait defining the interface for storage connections
///
/// Hands out repositories bound to one underlying store, so every service
/// created from the same connection observes the same data.
pub trait Connection: Send + Sync + Clone {
    /// The type of TransactionStorage this connection creates
    type TransactionRepository: TransactionStorage + Clone;

    /// Create a new transaction repository for this connection
    fn create_transaction_repository(&self) -> Self::TransactionRepository;
}
