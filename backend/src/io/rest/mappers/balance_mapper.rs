//! Mappers between the balance endpoint's wire types and the domain query.

use chrono::{DateTime, Utc};

use crate::domain::commands::balance::GetUserBalanceQuery;
use crate::domain::models::BalanceInfo;
use crate::io::rest::ApiError;
use shared::{BalanceRequest, BalanceResponse};

pub struct BalanceMapper;

impl BalanceMapper {
    /// Builds the domain query from the raw path segment and query string.
    pub fn to_query(user_id: &str, request: &BalanceRequest) -> Result<GetUserBalanceQuery, ApiError> {
        let user_id = user_id
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request("Invalid user_id format"))?;

        Ok(GetUserBalanceQuery {
            user_id,
            from: parse_bound("from", request.from.as_deref())?,
            to: parse_bound("to", request.to.as_deref())?,
        })
    }

    pub fn to_dto(info: BalanceInfo) -> BalanceResponse {
        BalanceResponse {
            balance: info.balance,
            total_debits: info.total_debits,
            total_credits: info.total_credits,
        }
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                ApiError::bad_request(format!(
                    "Invalid '{}' date format. Expected: YYYY-MM-DDTHH:MM:SSZ",
                    name
                ))
            }),
    }
}
