//! CSV migration: parse uploaded transaction files into the store.
//!
//! The file must start with the header `id,user_id,amount,datetime`. Rows
//! that fail to parse are counted and skipped; only file-level problems
//! (empty input, wrong header, unreadable CSV) abort a migration.

use std::io::Read;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ByteRecord, FromUtf8Error, ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::commands::migration::{MigrateCsvCommand, MigrationResult};
use crate::domain::models::{MigrationReport, MigrationStats, Transaction};
use crate::domain::report_service::ReportDispatcher;
use crate::storage::{Connection, TransactionStorage};

pub const EXPECTED_HEADER: [&str; 4] = ["id", "user_id", "amount", "datetime"];

/// Accepted timestamp layouts, tried in order. All are read as UTC.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("CSV file is empty")]
    EmptyFile,
    #[error("invalid CSV header. Expected: {expected:?}, Got: {got:?}")]
    InvalidHeader { expected: Vec<String>, got: Vec<String> },
    #[error("error reading CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a single row was rejected
#[derive(Debug, Error)]
pub enum RowParseError {
    #[error("invalid number of columns: expected 4, got {0}")]
    ColumnCount(usize),
    #[error("invalid id: {0}")]
    Id(ParseIntError),
    #[error("invalid user_id: {0}")]
    UserId(ParseIntError),
    #[error("invalid amount: {0}")]
    Amount(ParseFloatError),
    #[error("invalid amount: {0} is not a finite number")]
    NonFiniteAmount(String),
    #[error("invalid datetime '{0}'")]
    DateTime(String),
    #[error("invalid UTF-8: {0}")]
    Encoding(FromUtf8Error),
}

#[derive(Clone)]
pub struct MigrationService<C: Connection> {
    transaction_repository: C::TransactionRepository,
    reports: ReportDispatcher,
}

impl<C: Connection> MigrationService<C> {
    pub fn new(connection: Arc<C>, reports: ReportDispatcher) -> Self {
        let transaction_repository = connection.create_transaction_repository();
        Self {
            transaction_repository,
            reports,
        }
    }

    /// Migrate an uploaded file held in memory.
    pub fn migrate(&self, command: MigrateCsvCommand) -> Result<MigrationResult, MigrationError> {
        let file_size = command.content.len() as u64;
        let stats = self.process_csv(command.content.as_slice(), &command.filename, file_size)?;
        Ok(MigrationResult {
            filename: command.filename,
            stats,
        })
    }

    /// Parse `reader` as a transaction CSV and store every valid row.
    ///
    /// Once the file has been read a report is queued for background
    /// delivery; this call does not wait for it.
    pub fn process_csv<R: Read>(
        &self,
        reader: R,
        filename: &str,
        file_size: u64,
    ) -> Result<MigrationStats, MigrationError> {
        let started = Instant::now();
        info!("Starting migration of {} ({} bytes)", filename, file_size);

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        // byte records so a badly encoded row is rejected on its own
        let mut records = csv_reader.byte_records();

        let header = records.next().ok_or(MigrationError::EmptyFile)??;
        validate_header(&header)?;

        let mut stats = MigrationStats::new();

        for (index, result) in records.enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|position| position.line())
                .unwrap_or(index as u64 + 2);
            stats.total_records += 1;

            let parsed = StringRecord::from_byte_record(record)
                .map_err(RowParseError::Encoding)
                .and_then(|record| parse_transaction(&record));
            let transaction = match parsed {
                Ok(transaction) => transaction,
                Err(e) => {
                    warn!("Skipping line {} of {}: {}", line, filename, e);
                    stats.record_error(line, e);
                    continue;
                }
            };

            match self.transaction_repository.save_transaction(transaction) {
                Ok(saved) => stats.record_success(&saved),
                Err(e) => {
                    warn!("Failed to store line {} of {}: {}", line, filename, e);
                    stats.record_error(line, e);
                }
            }
        }

        let elapsed = started.elapsed();
        info!(
            "Migration of {} finished in {:?}: {} total, {} stored, {} rejected",
            filename, elapsed, stats.total_records, stats.success_records, stats.error_records
        );

        self.reports
            .dispatch(MigrationReport::from_stats(&stats, filename, file_size, elapsed));

        Ok(stats)
    }
}

fn validate_header(header: &ByteRecord) -> Result<(), MigrationError> {
    if header
        .iter()
        .eq(EXPECTED_HEADER.iter().map(|column| column.as_bytes()))
    {
        Ok(())
    } else {
        Err(MigrationError::InvalidHeader {
            expected: EXPECTED_HEADER.iter().map(|s| s.to_string()).collect(),
            got: header
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        })
    }
}

/// Convert one data row into a transaction.
pub fn parse_transaction(record: &StringRecord) -> Result<Transaction, RowParseError> {
    if record.len() != EXPECTED_HEADER.len() {
        return Err(RowParseError::ColumnCount(record.len()));
    }

    let id = record[0].parse::<i64>().map_err(RowParseError::Id)?;
    let user_id = record[1].parse::<i64>().map_err(RowParseError::UserId)?;
    let amount = record[2].parse::<f64>().map_err(RowParseError::Amount)?;
    if !amount.is_finite() {
        return Err(RowParseError::NonFiniteAmount(record[2].to_string()));
    }
    let date_time = parse_datetime(&record[3])?;

    Ok(Transaction::new(id, user_id, amount, date_time))
}

/// Parse a CSV timestamp: date and time separated by a space, then by `T`,
/// then a bare date at midnight.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, RowParseError> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RowParseError::DateTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report_service::{report_queue, ReportReceiver};
    use crate::storage::{MemoryConnection, TransactionRepository};
    use chrono::TimeZone;

    fn setup_service() -> (
        MigrationService<MemoryConnection>,
        TransactionRepository,
        ReportReceiver,
    ) {
        let connection = Arc::new(MemoryConnection::new());
        let repository = connection.create_transaction_repository();
        let (dispatcher, receiver) = report_queue();
        (MigrationService::new(connection, dispatcher), repository, receiver)
    }

    #[test]
    fn test_process_csv() {
        let (service, repository, _receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
1,1001,150.50,2024-01-15 10:30:00
2,1001,-75.25,2024-01-15 14:45:00
3,1002,200.00,2024-01-16 09:15:00";

        let stats = service
            .process_csv(csv_content.as_bytes(), "test.csv", csv_content.len() as u64)
            .unwrap();

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.success_records, 3);
        assert_eq!(stats.error_records, 0);
        assert!(stats.errors.is_empty());

        assert_eq!(repository.count_transactions().unwrap(), 3);
        let first = repository.get_transaction(1).unwrap().unwrap();
        assert_eq!(first.user_id, 1001);
        assert_eq!(first.amount, 150.50);
        assert_eq!(
            first.date_time,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert!(repository.get_transaction(2).unwrap().is_some());
        assert!(repository.get_transaction(3).unwrap().is_some());
    }

    #[test]
    fn test_process_csv_with_errors() {
        let (service, repository, _receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
1,1001,150.50,2024-01-15 10:30:00
2,invalid_user,invalid_amount,invalid_date
3,1002,200.00,2024-01-16 09:15:00";

        let stats = service.process_csv(csv_content.as_bytes(), "test.csv", 0).unwrap();

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.success_records, 2);
        assert_eq!(stats.error_records, 1);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(stats.errors[0].line, 3);
        assert!(stats.errors[0].message.starts_with("invalid user_id"));

        assert_eq!(repository.count_transactions().unwrap(), 2);
        assert!(repository.get_transaction(2).unwrap().is_none());
    }

    #[test]
    fn test_non_numeric_amount_is_row_error() {
        let (service, repository, _receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
1,1001,abc,2024-01-15
2,1001,10.00,2024-01-15";

        let stats = service.process_csv(csv_content.as_bytes(), "test.csv", 0).unwrap();

        assert_eq!(stats.success_records, 1);
        assert_eq!(stats.error_records, 1);
        assert!(stats.errors[0].message.starts_with("invalid amount"));
        assert_eq!(repository.count_transactions().unwrap(), 1);
    }

    #[test]
    fn test_wrong_column_count_is_row_error() {
        let (service, _repository, _receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
1,1001,10.00
2,1001,10.00,2024-01-15,extra
3,1001,10.00,2024-01-15";

        let stats = service.process_csv(csv_content.as_bytes(), "test.csv", 0).unwrap();

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.success_records, 1);
        assert_eq!(stats.error_records, 2);
        assert_eq!(
            stats.errors[0].to_string(),
            "Line 2: invalid number of columns: expected 4, got 3"
        );
    }

    #[test]
    fn test_invalid_utf8_row_is_row_error() {
        let (service, repository, mut receiver) = setup_service();
        let mut csv_content = b"id,user_id,amount,datetime\n1,1001,1.00,2024-01-15\n2,1001,".to_vec();
        csv_content.extend_from_slice(b"\xff,2024-01-15\n3,1001,2.00,2024-01-16\n");

        let stats = service
            .process_csv(csv_content.as_slice(), "latin1.csv", 0)
            .unwrap();

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.success_records, 2);
        assert_eq!(stats.error_records, 1);
        assert_eq!(stats.errors[0].line, 3);
        assert!(stats.errors[0].message.starts_with("invalid UTF-8"));
        assert_eq!(repository.count_transactions().unwrap(), 2);
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn test_store_rejection_is_row_error() {
        let (service, repository, _receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
9223372036854775807,1,1.00,2024-01-15
5,1,2.00,2024-01-16";

        let stats = service.process_csv(csv_content.as_bytes(), "max.csv", 0).unwrap();

        assert_eq!(stats.success_records, 1);
        assert_eq!(stats.error_records, 1);
        assert_eq!(stats.errors[0].line, 2);
        assert_eq!(repository.count_transactions().unwrap(), 1);
        assert!(repository.get_transaction(5).unwrap().is_some());
    }

    #[test]
    fn test_process_csv_empty_file() {
        let (service, _repository, mut receiver) = setup_service();

        let result = service.process_csv("".as_bytes(), "empty.csv", 0);

        assert!(matches!(result, Err(MigrationError::EmptyFile)));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_process_csv_invalid_header() {
        let (service, repository, _receiver) = setup_service();
        let csv_content = "id,user,amount,date
1,1001,150.50,2024-01-15 10:30:00";

        let result = service.process_csv(csv_content.as_bytes(), "test.csv", 0);

        match result {
            Err(MigrationError::InvalidHeader { expected, got }) => {
                assert_eq!(expected, vec!["id", "user_id", "amount", "datetime"]);
                assert_eq!(got, vec!["id", "user", "amount", "date"]);
            }
            other => panic!("expected invalid header, got {:?}", other.map(|s| s.total_records)),
        }
        assert_eq!(repository.count_transactions().unwrap(), 0);
    }

    #[test]
    fn test_header_with_reordered_columns_rejected() {
        let (service, _repository, _receiver) = setup_service();
        let result = service.process_csv("user_id,id,amount,datetime\n".as_bytes(), "test.csv", 0);
        assert!(matches!(result, Err(MigrationError::InvalidHeader { .. })));
    }

    #[test]
    fn test_header_only_file() {
        let (service, _repository, _receiver) = setup_service();
        let stats = service
            .process_csv("id,user_id,amount,datetime\n".as_bytes(), "test.csv", 0)
            .unwrap();

        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.success_records, 0);
    }

    #[test]
    fn test_zero_id_gets_assigned() {
        let (service, repository, _receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
0,1001,10.00,2024-01-15
0,1001,20.00,2024-01-16";

        let stats = service.process_csv(csv_content.as_bytes(), "test.csv", 0).unwrap();

        assert_eq!(stats.success_records, 2);
        let ids: Vec<i64> = repository
            .list_all_transactions()
            .unwrap()
            .iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_migration_queues_report() {
        let (service, _repository, mut receiver) = setup_service();
        let csv_content = "id,user_id,amount,datetime
1,1001,150.50,2024-01-15 10:30:00
2,1002,-75.25,2024-01-17
3,1001,oops,2024-01-16";

        service
            .process_csv(csv_content.as_bytes(), "upload.csv", 99)
            .unwrap();

        let report = receiver.try_recv().unwrap();
        assert_eq!(report.filename, "upload.csv");
        assert_eq!(report.file_size, 99);
        assert_eq!(report.total_records, 3);
        assert_eq!(report.success_records, 2);
        assert_eq!(report.error_records, 1);
        assert_eq!(report.users_affected, 2);
        assert_eq!(report.largest_amount, 150.50);
        assert_eq!(report.smallest_amount, -75.25);

        let range = report.date_range.unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        assert_eq!(range.to, Utc.with_ymd_and_hms(2024, 1, 17, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_migrate_command() {
        let (service, _repository, _receiver) = setup_service();
        let command = MigrateCsvCommand {
            filename: "batch.csv".to_string(),
            content: b"id,user_id,amount,datetime\n1,7,5.00,2024-02-01T08:00:00\n".to_vec(),
        };

        let result = service.migrate(command).unwrap();

        assert_eq!(result.filename, "batch.csv");
        assert_eq!(result.stats.success_records, 1);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_datetime("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-15T10:30:00").unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-01-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );

        assert!(parse_datetime("15/01/2024").is_err());
        assert!(parse_datetime("2024-01-15 10:30").is_err());
        assert!(parse_datetime("").is_err());
    }

    #[test]
    fn test_parse_transaction_rejects_non_finite_amount() {
        let record = StringRecord::from(vec!["1", "1001", "NaN", "2024-01-15"]);
        assert!(matches!(
            parse_transaction(&record),
            Err(RowParseError::NonFiniteAmount(_))
        ));
    }
}
