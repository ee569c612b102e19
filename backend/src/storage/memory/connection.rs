use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::domain::models::Transaction;
use crate::storage::traits::Connection;
use super::transaction_repository::TransactionRepository;

/// Contents of the store: transactions by ID and the next ID to assign.
#[derive(Debug)]
pub(crate) struct TransactionTable {
    pub(crate) transactions: HashMap<i64, Transaction>,
    pub(crate) next_id: i64,
}

impl TransactionTable {
    fn new() -> Self {
        Self {
            transactions: HashMap::new(),
            next_id: 1,
        }
    }
}

/// MemoryConnection owns the shared transaction table. Clones share the same
/// table, so repositories created from any clone see the same data.
#[derive(Clone)]
pub struct MemoryConnection {
    table: Arc<RwLock<TransactionTable>>,
}

impl MemoryConnection {
    /// Create a connection to a fresh, empty store
    pub fn new() -> Self {
        info!("Creating in-memory transaction store");
        Self {
            table: Arc::new(RwLock::new(TransactionTable::new())),
        }
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    type TransactionRepository = TransactionRepository;

    fn create_transaction_repository(&self) -> Self::TransactionRepository {
        TransactionRepository::new(self.table.clone())
    }
}
