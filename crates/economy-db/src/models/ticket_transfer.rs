use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the ticket_transfers audit table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTicketTransfer {
    /// Transfer id (primary key)
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub trade_id: Option<Uuid>,
    pub price_tokens: i64,
    pub created_at: DateTime<Utc>,
}

impl DbTicketTransfer {
    pub fn new(
        ticket_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        trade_id: Option<Uuid>,
        price_tokens: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            from_user_id,
            to_user_id,
            trade_id,
            price_tokens,
            created_at: now,
        }
    }
}
