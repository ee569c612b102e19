//! Balance queries over stored transactions.
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::domain::commands::balance::GetUserBalanceQuery;
use crate::domain::models::BalanceInfo;
use crate::storage::{Connection, StorageError, TransactionStorage};

#[derive(Debug, Error)]
pub enum UsersError {
    /// No transactions for the user in the requested window. A user only
    /// exists through their transactions, so the two cases are the same.
    #[error("User not found")]
    UserNotFound(i64),
    #[error("Invalid date range: 'from' date must be before 'to' date")]
    InvalidDateRange,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct UsersService<C: Connection> {
    transaction_repository: C::TransactionRepository,
}

impl<C: Connection> UsersService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let transaction_repository = connection.create_transaction_repository();
        Self {
            transaction_repository,
        }
    }

    /// Sum a user's transactions, optionally restricted to `[from, to]`.
    pub fn get_user_balance(&self, query: GetUserBalanceQuery) -> Result<BalanceInfo, UsersError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(UsersError::InvalidDateRange);
            }
        }

        let transactions = self.transaction_repository.list_transactions_by_user(
            query.user_id,
            query.from,
            query.to,
        )?;

        if transactions.is_empty() {
            return Err(UsersError::UserNotFound(query.user_id));
        }

        let info = BalanceInfo::from_transactions(&transactions);
        info!(
            "Balance for user {} over {} transactions: {:.2}",
            query.user_id,
            transactions.len(),
            info.balance
        );
        Ok(info)
    }
}
