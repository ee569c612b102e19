//! # REST API for Service Metadata
//!
//! Health check, the root service description and the JSON bodies used for
//! unknown routes and unsupported methods.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use crate::io::rest::ApiError;
use crate::AppState;
use shared::{HealthResponse, ServiceEndpoints, ServiceInfoResponse};

pub const SERVICE_NAME: &str = "ledger-api";

/// Create a router for the health endpoint
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health).fallback(method_not_allowed))
}

pub async fn health() -> impl IntoResponse {
    info!("GET /api/v1/health");
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
        }),
    )
}

/// Static description of the service served at `/`
pub async fn service_info() -> impl IntoResponse {
    info!("GET /");
    Json(ServiceInfoResponse {
        message: "Ledger API - CSV transaction migration and balance service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ServiceEndpoints {
            migrate: "POST /api/v1/migrate".to_string(),
            balance: "GET /api/v1/users/{user_id}/balance".to_string(),
            health: "GET /api/v1/health".to_string(),
        },
    })
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
