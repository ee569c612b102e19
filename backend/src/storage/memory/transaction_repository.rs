use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::connection::TransactionTable;
use crate::domain::models::Transaction;
use crate::storage::traits::{StorageError, StorageResult, TransactionStorage};

/// In-memory transaction repository
#[derive(Clone)]
pub struct TransactionRepository {
    table: Arc<RwLock<TransactionTable>>,
}

impl TransactionRepository {
    pub(crate) fn new(table: Arc<RwLock<TransactionTable>>) -> Self {
        Self { table }
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, TransactionTable>> {
        self.table.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, TransactionTable>> {
        self.table.write().map_err(|_| StorageError::LockPoisoned)
    }
}

fn within_range(
    transaction: &Transaction,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.map_or(true, |from| transaction.date_time >= from)
        && to.map_or(true, |to| transaction.date_time <= to)
}

impl TransactionStorage for TransactionRepository {
    fn save_transaction(&self, mut transaction: Transaction) -> StorageResult<Transaction> {
        let mut table = self.write()?;

        if transaction.id == 0 {
            transaction.id = table.next_id;
        }
        // the counter must always stay past the highest stored ID
        if transaction.id >= table.next_id {
            table.next_id = transaction
                .id
                .checked_add(1)
                .ok_or(StorageError::IdSpaceExhausted(transaction.id))?;
        }

        debug!(
            "Saving transaction {} for user {} ({:.2})",
            transaction.id, transaction.user_id, transaction.amount
        );
        table.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    fn get_transaction(&self, id: i64) -> StorageResult<Option<Transaction>> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    fn list_transactions_by_user(
        &self,
        user_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StorageResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .read()?
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id && within_range(tx, from, to))
            .cloned()
            .collect();

        transactions.sort_by(|a, b| a.date_time.cmp(&b.date_time).then(a.id.cmp(&b.id)));
        Ok(transactions)
    }

    fn list_all_transactions(&self) -> StorageResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> =
            self.read()?.transactions.values().cloned().collect();
        transactions.sort_by_key(|tx| tx.id);
        Ok(transactions)
    }

    fn count_transactions(&self) -> StorageResult<usize> {
        Ok(self.read()?.transactions.len())
    }

    fn clear_transactions(&self) -> StorageResult<()> {
        let mut table = self.write()?;
        table.transactions.clear();
        table.next_id = 1;
        Ok(())
    }
}
