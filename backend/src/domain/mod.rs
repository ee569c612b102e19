//! # Domain Module
//!
//! Business logic for the ledger service, independent of HTTP and of how
//! transactions are stored.
//!
//! ## Module Organization
//!
//! - **migration_service**: Parses uploaded CSV files and stores each valid row
//! - **users_service**: Computes a user's balance over an optional date window
//! - **report_service**: Delivers migration reports in the background
//! - **commands**: Inputs and results passed between the IO and domain layers
//! - **models**: Transactions, balances and migration statistics
//!
//! ## Business Rules
//!
//! - Positive amounts are credits, negative amounts are debits
//! - A bad row never aborts a migration; it is counted and reported
//! - A user with no transactions in the requested window is "not found"
//! - Reporting never blocks or fails the upload that triggered it

pub mod commands;
pub mod migration_service;
pub mod models;
pub mod report_service;
pub mod users_service;

pub use migration_service::{MigrationError, MigrationService};
pub use report_service::{
    report_queue, ReportChannel, ReportConfig, ReportDispatcher, ReportError, ReportService,
    ReportWorker,
};
pub use users_service::{UsersError, UsersService};
