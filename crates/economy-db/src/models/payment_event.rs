use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Database model for the billing_payment_events table.
///
/// One row per (provider, provider_event_id). The unique constraint is the
/// webhook replay guard: insertion conflict means the event was already
/// accepted and its side effects must not run again.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbPaymentEvent {
    pub provider: String,
    pub provider_event_id: String,
    pub processing_status: String,
    pub minted_quantity: i32,
    pub failure_reason: Option<String>,
    /// Normalized event snapshot, kept for reconciliation
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
