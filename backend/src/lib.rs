//! # Ledger API
//!
//! HTTP service that imports transaction CSV files into an in-memory store
//! and answers balance queries per user.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST handlers, DTO mappers)
//!     ↓
//! Domain Layer (migration, balances, report delivery)
//!     ↓
//! Storage Layer (in-memory transaction store)
//! ```
//!
//! The store is created once here and shared by every service through a
//! `Connection`. Migration reports flow from the migration service to a
//! background [`ReportWorker`] through an unbounded queue, so an upload never
//! waits on email or webhook delivery.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AppConfig, ServerConfig};
use crate::domain::{
    report_queue, MigrationService, ReportConfig, ReportDispatcher, ReportService, ReportWorker,
    UsersService,
};
use crate::io::rest::{balance_apis, migration_apis, system_apis};
use crate::storage::MemoryConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub migration_service: MigrationService<MemoryConnection>,
    pub users_service: UsersService<MemoryConnection>,
}

impl AppState {
    pub fn new(connection: Arc<MemoryConnection>, reports: ReportDispatcher) -> Self {
        Self {
            migration_service: MigrationService::new(connection.clone(), reports),
            users_service: UsersService::new(connection),
        }
    }
}

/// Initialize the backend with all required services.
///
/// Must be called from inside a Tokio runtime: the report worker is spawned
/// onto it.
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up transaction store");
    let connection = Arc::new(MemoryConnection::new());

    build_app_state(connection, config.report.clone())
}

/// Wire services around an existing store and start the report worker.
pub fn build_app_state(
    connection: Arc<MemoryConnection>,
    report_config: ReportConfig,
) -> Result<AppState> {
    info!("Starting report worker");
    let report_service =
        ReportService::new(report_config).context("Failed to set up report delivery")?;
    let (reports, receiver) = report_queue();
    ReportWorker::new(receiver, report_service).spawn();

    info!("Setting up application state");
    Ok(AppState::new(connection, reports))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, server: &ServerConfig) -> Result<Router> {
    let allow_origin = match &server.cors_allowed_origin {
        Some(origin) => AllowOrigin::exact(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
        ),
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(migration_apis::router())
        .merge(balance_apis::router())
        .merge(system_apis::router());

    Ok(Router::new()
        .route(
            "/",
            get(system_apis::service_info).fallback(system_apis::method_not_allowed),
        )
        .nest("/api/v1", api_routes)
        .fallback(system_apis::not_found)
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use shared::{BalanceResponse, ErrorResponse, HealthResponse, MigrationResponse, ServiceInfoResponse};
    use tower::util::ServiceExt; // for `oneshot`

    fn setup_test_app() -> Router {
        let (reports, _receiver) = report_queue();
        let state = AppState::new(Arc::new(MemoryConnection::new()), reports);
        create_router(state, &ServerConfig::default()).unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_query_balance() {
        let app = setup_test_app();
        let csv = "id,user_id,amount,datetime\r\n1,1001,150.50,2024-01-15 10:30:00\r\n2,1001,-75.25,2024-01-15 14:45:00\r\n3,1002,200.00,2024-01-16 09:15:00\r\n";
        let body = format!(
            "--X\r\nContent-Disposition: form-data; name=\"csv_file\"; filename=\"test.csv\"\r\nContent-Type: text/csv\r\n\r\n{}\r\n--X--\r\n",
            csv
        );
        let upload = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/migrate")
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let migration: MigrationResponse = json_body(response).await;
        assert_eq!(migration.data.success_records, 3);

        let response = app
            .oneshot(get_request("/api/v1/users/1001/balance"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let balance: BalanceResponse = json_body(response).await;
        assert_eq!(balance.balance, 75.25);
        assert_eq!(balance.total_debits, -75.25);
        assert_eq!(balance.total_credits, 150.50);
    }

    #[tokio::test]
    async fn test_health_under_api_prefix() {
        let response = setup_test_app().oneshot(get_request("/api/v1/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = json_body(response).await;
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_root_describes_service() {
        let response = setup_test_app().oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let info: ServiceInfoResponse = json_body(response).await;
        assert_eq!(info.endpoints.health, "GET /api/v1/health");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        for uri in ["/nope", "/api/v1/nope", "/api/v2/health"] {
            let response = setup_test_app().oneshot(get_request(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            let error: ErrorResponse = json_body(response).await;
            assert_eq!(error, ErrorResponse::new("Endpoint not found", 404));
        }
    }

    #[tokio::test]
    async fn test_wrong_method_on_known_route() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();

        let response = setup_test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let error: ErrorResponse = json_body(response).await;
        assert_eq!(error, ErrorResponse::new("Method not allowed", 405));
    }

    #[tokio::test]
    async fn test_invalid_cors_origin_rejected() {
        let (reports, _receiver) = report_queue();
        let state = AppState::new(Arc::new(MemoryConnection::new()), reports);
        let server = ServerConfig {
            cors_allowed_origin: Some("bad\norigin".to_string()),
            ..ServerConfig::default()
        };

        assert!(create_router(state, &server).is_err());
    }

    #[tokio::test]
    async fn test_initialize_backend_with_defaults() {
        let state = initialize_backend(&AppConfig::default()).unwrap();
        let app = create_router(state, &ServerConfig::default()).unwrap();

        let response = app.oneshot(get_request("/api/v1/users/1/balance")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
