use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use economy_core::types::{Trade, TradeState};

use crate::{DatabaseError, Result};

/// Database model for the trades table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTrade {
    /// Trade id (primary key)
    pub id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    /// jsonb array of ticket uuids (non-empty)
    pub ticket_ids: Value,
    pub price_tokens: i64,
    pub state: String,
    pub seller_confirmed_at: Option<DateTime<Utc>>,
    pub buyer_confirmed_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl DbTrade {
    pub fn draft(
        id: Uuid,
        seller_id: Uuid,
        buyer_id: Uuid,
        ticket_ids: &[Uuid],
        price_tokens: i64,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seller_id,
            buyer_id,
            ticket_ids: Value::Array(
                ticket_ids
                    .iter()
                    .map(|t| Value::from(t.to_string()))
                    .collect(),
            ),
            price_tokens,
            state: TradeState::Draft.as_str().to_string(),
            seller_confirmed_at: None,
            buyer_confirmed_at: None,
            settled_at: None,
            cancelled_at: None,
            expires_at,
            created_at: now,
        }
    }

    pub fn into_trade(self) -> Result<Trade> {
        let state = TradeState::parse(&self.state).ok_or_else(|| DatabaseError::Corrupt {
            entity: "trade.state",
            reason: format!("unknown state {:?} for {}", self.state, self.id),
        })?;

        let ids = self
            .ticket_ids
            .as_array()
            .ok_or_else(|| DatabaseError::Corrupt {
                entity: "trade.ticket_ids",
                reason: "expected a JSON array".to_string(),
            })?;
        let mut ticket_ids = Vec::with_capacity(ids.len());
        for entry in ids {
            let id = entry
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| DatabaseError::Corrupt {
                    entity: "trade.ticket_ids",
                    reason: format!("not a uuid: {entry}"),
                })?;
            ticket_ids.push(id);
        }
        if ticket_ids.is_empty() {
            return Err(DatabaseError::Corrupt {
                entity: "trade.ticket_ids",
                reason: "trade has no tickets".to_string(),
            });
        }

        Ok(Trade {
            id: self.id,
            seller_id: self.seller_id,
            buyer_id: self.buyer_id,
            ticket_ids,
            price_tokens: self.price_tokens,
            state,
            seller_confirmed_at: self.seller_confirmed_at,
            buyer_confirmed_at: self.buyer_confirmed_at,
            settled_at: self.settled_at,
            cancelled_at: self.cancelled_at,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}
