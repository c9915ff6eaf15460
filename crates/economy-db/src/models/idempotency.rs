use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Database model for the idempotency_records table.
///
/// A completed operation persists its response under the caller-supplied
/// key; a retry with the same key gets that response back verbatim instead
/// of re-running the effect.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbIdempotencyRecord {
    /// Caller-supplied idempotency key (primary key)
    pub key: String,
    pub operation: String,
    pub response: Value,
    pub created_at: DateTime<Utc>,
}
