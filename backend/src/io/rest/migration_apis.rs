//! # REST API for CSV Migration
//!
//! `POST /api/v1/migrate` accepts a `multipart/form-data` upload whose
//! `csv_file` part holds the transactions to import.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use tracing::{error, info, warn};

use crate::domain::commands::migration::MigrateCsvCommand;
use crate::io::rest::mappers::migration_mapper::MigrationMapper;
use crate::io::rest::system_apis::method_not_allowed;
use crate::io::rest::ApiError;
use crate::AppState;

pub const FILE_FIELD: &str = "csv_file";

/// Create a router for migration related APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/migrate", post(migrate_csv).fallback(method_not_allowed))
}

/// Import an uploaded CSV file into the transaction store
pub async fn migrate_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/v1/migrate");

    let mut multipart = multipart.map_err(|rejection| {
        warn!("Rejected migration upload: {}", rejection);
        ApiError::bad_request("Content-Type must be multipart/form-data")
    })?;

    let command = read_csv_upload(&mut multipart).await?;
    info!(
        "Received {} ({} bytes) for migration",
        command.filename,
        command.content.len()
    );

    // parsing is CPU bound, keep it off the async workers
    let service = state.migration_service.clone();
    let result = tokio::task::spawn_blocking(move || service.migrate(command))
        .await
        .map_err(|e| {
            error!("Migration task failed: {}", e);
            ApiError::internal("Internal server error")
        })??;

    Ok((StatusCode::OK, Json(MigrationMapper::to_response(result))))
}

async fn read_csv_upload(multipart: &mut Multipart) -> Result<MigrateCsvCommand, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Failed to read multipart body: {}", e);
        ApiError::bad_request("Error parsing multipart form")
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_csv_upload(&filename, &content_type) {
            return Err(ApiError::bad_request("File must be a CSV file"));
        }

        let content = field.bytes().await.map_err(|e| {
            warn!("Failed to read {}: {}", filename, e);
            ApiError::bad_request("Error parsing multipart form")
        })?;

        return Ok(MigrateCsvCommand {
            filename,
            content: content.to_vec(),
        });
    }

    Err(ApiError::bad_request(format!(
        "Error retrieving CSV file: no '{}' field in form",
        FILE_FIELD
    )))
}

/// A part is accepted when it is declared `text/csv` or named `*.csv`.
fn is_csv_upload(filename: &str, content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("text/csv") || filename.to_ascii_lowercase().ends_with(".csv")
}
