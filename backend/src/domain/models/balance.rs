//! Derived balance figures for one user.
use super::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BalanceInfo {
    pub balance: f64,
    /// Sum of negative amounts
    pub total_debits: f64,
    /// Sum of positive amounts
    pub total_credits: f64,
}

impl BalanceInfo {
    /// Fold a set of transactions into balance, debit and credit totals.
    /// Zero amounts count towards neither side.
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .fold(Self::default(), |mut info, transaction| {
                info.balance += transaction.amount;
                if transaction.is_debit() {
                    info.total_debits += transaction.amount;
                } else if transaction.is_credit() {
                    info.total_credits += transaction.amount;
                }
                info
            })
    }
}
