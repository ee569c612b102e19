//! Mapper from migration results to the upload response DTO.

use crate::domain::commands::migration::MigrationResult;
use shared::{MigrationResponse, MigrationSummary};

pub struct MigrationMapper;

impl MigrationMapper {
    pub fn to_response(result: MigrationResult) -> MigrationResponse {
        MigrationResponse {
            success: true,
            message: "Migration completed successfully".to_string(),
            data: Self::to_summary(result),
        }
    }

    pub fn to_summary(result: MigrationResult) -> MigrationSummary {
        MigrationSummary {
            filename: result.filename,
            total_records: result.stats.total_records,
            success_records: result.stats.success_records,
            error_records: result.stats.error_records,
            errors: result.stats.errors.iter().map(ToString::to_string).collect(),
        }
    }
}
