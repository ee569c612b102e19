//! Domain-level command and query types.
//! These are built by the REST layer from the public DTOs in the `shared`
//! crate and never cross the API boundary themselves.

pub mod migration {
    use crate::domain::models::MigrationStats;

    /// One uploaded CSV file.
    #[derive(Debug, Clone)]
    pub struct MigrateCsvCommand {
        pub filename: String,
        pub content: Vec<u8>,
    }

    /// Result of migrating one file.
    #[derive(Debug, Clone)]
    pub struct MigrationResult {
        pub filename: String,
        pub stats: MigrationStats,
    }
}

pub mod balance {
    use chrono::{DateTime, Utc};

    /// Balance lookup for one user with optional inclusive date bounds.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GetUserBalanceQuery {
        pub user_id: i64,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
    }

    impl GetUserBalanceQuery {
        pub fn for_user(user_id: i64) -> Self {
            Self {
                user_id,
                from: None,
                to: None,
            }
        }
    }
}
