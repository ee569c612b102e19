pub mod transaction;
pub mod balance;
pub mod migration;

pub use transaction::Transaction;
pub use balance::BalanceInfo;
pub use migration::{DateRange, MigrationReport, MigrationStats, RowError};
