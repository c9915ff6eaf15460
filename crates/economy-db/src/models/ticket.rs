use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use economy_core::types::{MarketplaceTicket, TicketSource, TicketStatus};

use crate::{DatabaseError, Result};

/// Database model for the marketplace_tickets table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTicket {
    /// Ticket id (primary key)
    pub ticket_id: Uuid,
    pub owner_user_id: Uuid,
    pub source: String,
    pub status: String,
    pub redeem_value_months: i32,
    pub listed_price_tokens: Option<i64>,
    pub active_trade_id: Option<Uuid>,
    /// Unique; prevents double-minting the same payment
    pub payment_ref: String,
    pub created_at: DateTime<Utc>,
    pub transferred_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl DbTicket {
    pub fn minted(owner: Uuid, payment_ref: String, now: DateTime<Utc>) -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            owner_user_id: owner,
            source: TicketSource::FiatMint.as_str().to_string(),
            status: TicketStatus::Owned.as_str().to_string(),
            redeem_value_months: 1,
            listed_price_tokens: None,
            active_trade_id: None,
            payment_ref,
            created_at: now,
            transferred_at: None,
            redeemed_at: None,
        }
    }

    pub fn into_ticket(self) -> Result<MarketplaceTicket> {
        let status = TicketStatus::parse(&self.status).ok_or_else(|| DatabaseError::Corrupt {
            entity: "ticket.status",
            reason: format!("unknown status {:?} for {}", self.status, self.ticket_id),
        })?;
        let source = TicketSource::parse(&self.source).ok_or_else(|| DatabaseError::Corrupt {
            entity: "ticket.source",
            reason: format!("unknown source {:?} for {}", self.source, self.ticket_id),
        })?;
        Ok(MarketplaceTicket {
            ticket_id: self.ticket_id,
            owner_user_id: self.owner_user_id,
            source,
            status,
            redeem_value_months: self.redeem_value_months,
            listed_price_tokens: self.listed_price_tokens,
            active_trade_id: self.active_trade_id,
            payment_ref: self.payment_ref,
            created_at: self.created_at,
            transferred_at: self.transferred_at,
            redeemed_at: self.redeemed_at,
        })
    }
}
