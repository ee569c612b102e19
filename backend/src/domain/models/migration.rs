//! Statistics collected while migrating a CSV file, and the report built from them.
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::Transaction;

/// A rejected CSV row: its 1-based line in the file and the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

/// Running statistics for one migration. Updated row by row so the parsed
/// transactions never need to be held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationStats {
    pub total_records: usize,
    pub success_records: usize,
    pub error_records: usize,
    pub errors: Vec<RowError>,
    pub users_affected: HashSet<i64>,
    pub total_amount: f64,
    pub largest_amount: Option<f64>,
    pub smallest_amount: Option<f64>,
    pub first_date: Option<DateTime<Utc>>,
    pub last_date: Option<DateTime<Utc>>,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, transaction: &Transaction) {
        self.success_records += 1;
        self.users_affected.insert(transaction.user_id);
        self.total_amount += transaction.amount;

        self.largest_amount = Some(
            self.largest_amount
                .map_or(transaction.amount, |largest| largest.max(transaction.amount)),
        );
        self.smallest_amount = Some(
            self.smallest_amount
                .map_or(transaction.amount, |smallest| smallest.min(transaction.amount)),
        );

        self.first_date = Some(
            self.first_date
                .map_or(transaction.date_time, |first| first.min(transaction.date_time)),
        );
        self.last_date = Some(
            self.last_date
                .map_or(transaction.date_time, |last| last.max(transaction.date_time)),
        );
    }

    pub fn record_error(&mut self, line: u64, reason: impl fmt::Display) {
        self.error_records += 1;
        self.errors.push(RowError {
            line,
            message: reason.to_string(),
        });
    }

    /// Mean amount over successful rows, `0.0` when nothing was stored.
    pub fn average_amount(&self) -> f64 {
        if self.success_records == 0 {
            0.0
        } else {
            self.total_amount / self.success_records as f64
        }
    }

    pub fn date_range(&self) -> Option<DateRange> {
        match (self.first_date, self.last_date) {
            (Some(from), Some(to)) => Some(DateRange { from, to }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Summary of a finished migration handed to the report worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub filename: String,
    pub file_size: u64,
    pub total_records: usize,
    pub success_records: usize,
    pub error_records: usize,
    pub processing_time_ms: u64,
    pub users_affected: usize,
    pub total_amount: f64,
    pub average_amount: f64,
    pub largest_amount: f64,
    pub smallest_amount: f64,
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RowError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_file_csv: Option<String>,
}

impl MigrationReport {
    pub fn from_stats(
        stats: &MigrationStats,
        filename: &str,
        file_size: u64,
        processing_time: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            filename: filename.to_string(),
            file_size,
            total_records: stats.total_records,
            success_records: stats.success_records,
            error_records: stats.error_records,
            processing_time_ms: processing_time.as_millis() as u64,
            users_affected: stats.users_affected.len(),
            total_amount: stats.total_amount,
            average_amount: stats.average_amount(),
            largest_amount: stats.largest_amount.unwrap_or(0.0),
            smallest_amount: stats.smallest_amount.unwrap_or(0.0),
            date_range: stats.date_range(),
            errors: stats.errors.clone(),
            error_file_csv: None,
        }
    }

    /// Percentage of data rows that were stored.
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.success_records as f64 / self.total_records as f64 * 100.0
        }
    }
}
