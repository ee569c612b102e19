//! Domain model for a ledger transaction.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique within the store; `0` asks the store to assign one
    pub id: i64,
    pub user_id: i64,
    /// Positive for credits, negative for debits
    pub amount: f64,
    pub date_time: DateTime<Utc>,
}

impl Transaction {
    pub fn new(id: i64, user_id: i64, amount: f64, date_time: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            amount,
            date_time,
        }
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_credit(&self) -> bool {
        self.amount > 0.0
    }
}
