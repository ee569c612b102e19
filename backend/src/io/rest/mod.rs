//! # REST API Interface Layer
//!
//! HTTP endpoints of the ledger service, mounted under `/api/v1`.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: CSV migration, user balances, health and service info
//! - **Error Handling**: Domain errors become `{"error", "status"}` JSON bodies
//! - **Input Validation**: Path and query parsing before the domain is called
//! - **Logging**: One `info!` line per request

pub mod balance_apis;
pub mod error;
pub mod mappers;
pub mod migration_apis;
pub mod system_apis;

pub use error::ApiError;
