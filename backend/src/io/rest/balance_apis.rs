//! # REST API for User Balances

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::{info, warn};

use crate::io::rest::mappers::balance_mapper::BalanceMapper;
use crate::io::rest::system_apis::method_not_allowed;
use crate::io::rest::ApiError;
use crate::AppState;
use shared::BalanceRequest;

/// Create a router for balance related APIs
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/:user_id/balance",
        get(get_user_balance).fallback(method_not_allowed),
    )
}

/// Balance, total debits and total credits of one user, optionally
/// restricted to an inclusive `from`/`to` window
pub async fn get_user_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<BalanceRequest>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(request) = query.map_err(|rejection| {
        warn!("Rejected balance query for user {}: {}", user_id, rejection);
        ApiError::bad_request("Invalid query parameters")
    })?;
    info!("GET /api/v1/users/{}/balance - query: {:?}", user_id, request);

    let query = BalanceMapper::to_query(&user_id, &request)?;
    let info = state.users_service.get_user_balance(query)?;

    Ok((StatusCode::OK, Json(BalanceMapper::to_dto(info))))
}
