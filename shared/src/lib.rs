use serde::{Deserialize, Serialize, Serializer};

/// Serialize a monetary value rounded to two decimal places.
fn serialize_two_decimals<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

/// Response body of `POST /api/v1/migrate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationResponse {
    pub success: bool,
    pub message: String,
    pub data: MigrationSummary,
}

/// Aggregate outcome of one CSV upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Name of the uploaded file as sent by the client
    pub filename: String,
    /// Number of data rows (header excluded)
    pub total_records: usize,
    /// Rows parsed and stored
    pub success_records: usize,
    /// Rows rejected
    pub error_records: usize,
    /// One message per rejected row, in file order ("Line N: reason")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Response body of `GET /api/v1/users/{user_id}/balance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Signed sum of all matching amounts
    #[serde(serialize_with = "serialize_two_decimals")]
    pub balance: f64,
    /// Sum of negative amounts (zero or negative)
    #[serde(serialize_with = "serialize_two_decimals")]
    pub total_debits: f64,
    /// Sum of positive amounts (zero or positive)
    #[serde(serialize_with = "serialize_two_decimals")]
    pub total_credits: f64,
}

/// Query string accepted by the balance endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceRequest {
    /// Inclusive lower bound (RFC 3339)
    pub from: Option<String>,
    /// Inclusive upper bound (RFC 3339)
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Static description served at `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub message: String,
    pub version: String,
    pub endpoints: ServiceEndpoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub migrate: String,
    pub balance: String,
    pub health: String,
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            status,
        }
    }
}
