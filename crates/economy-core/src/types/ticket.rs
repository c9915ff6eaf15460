use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel stored in `listed_price_tokens` for gift listings, so that
/// "listed for free" is distinguishable from "not listed". Never surfaced
/// to callers; the public price of a gift listing is 0.
pub const GIFT_PRICE_SENTINEL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Owned,
    Listed,
    LockedInTrade,
    Redeemed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Owned => "OWNED",
            TicketStatus::Listed => "LISTED",
            TicketStatus::LockedInTrade => "LOCKED_IN_TRADE",
            TicketStatus::Redeemed => "REDEEMED",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<TicketStatus> {
        match s {
            "OWNED" => Some(TicketStatus::Owned),
            "LISTED" => Some(TicketStatus::Listed),
            "LOCKED_IN_TRADE" => Some(TicketStatus::LockedInTrade),
            "REDEEMED" => Some(TicketStatus::Redeemed),
            "CANCELLED" => Some(TicketStatus::Cancelled),
            _ => None,
        }
    }

    /// REDEEMED is terminal; every other status can still move.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Redeemed)
    }

    pub fn can_redeem(&self) -> bool {
        matches!(self, TicketStatus::Owned | TicketStatus::Cancelled)
    }

    pub fn can_list(&self) -> bool {
        matches!(self, TicketStatus::Owned)
    }

    pub fn can_transfer(&self) -> bool {
        matches!(self, TicketStatus::Listed | TicketStatus::LockedInTrade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketSource {
    /// Minted from a confirmed real-money payment. The only source today;
    /// tickets are never player-crafted.
    FiatMint,
}

impl TicketSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketSource::FiatMint => "fiat_mint",
        }
    }

    pub fn parse(s: &str) -> Option<TicketSource> {
        match s {
            "fiat_mint" => Some(TicketSource::FiatMint),
            _ => None,
        }
    }
}

/// A single-use, transferable credential for one month of premium time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceTicket {
    pub ticket_id: Uuid,
    pub owner_user_id: Uuid,
    pub source: TicketSource,
    pub status: TicketStatus,
    pub redeem_value_months: i32,
    pub listed_price_tokens: Option<i64>,
    pub active_trade_id: Option<Uuid>,
    /// Unique per payment unit; the double-mint guard for webhook replays.
    pub payment_ref: String,
    pub created_at: DateTime<Utc>,
    pub transferred_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl MarketplaceTicket {
    /// Public listing price: gift sentinel reads as 0.
    pub fn public_price(&self) -> Option<i64> {
        self.listed_price_tokens.map(|p| p.max(0))
    }

    pub fn is_locked_to(&self, trade_id: Uuid) -> bool {
        self.status == TicketStatus::LockedInTrade && self.active_trade_id == Some(trade_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            TicketStatus::Owned,
            TicketStatus::Listed,
            TicketStatus::LockedInTrade,
            TicketStatus::Redeemed,
            TicketStatus::Cancelled,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn redeemed_is_terminal() {
        assert!(TicketStatus::Redeemed.is_terminal());
        assert!(!TicketStatus::Redeemed.can_redeem());
        assert!(TicketStatus::Cancelled.can_redeem());
        assert!(TicketStatus::Owned.can_redeem());
    }

    #[test]
    fn gift_sentinel_reads_as_zero() {
        let ticket = MarketplaceTicket {
            ticket_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            source: TicketSource::FiatMint,
            status: TicketStatus::Listed,
            redeem_value_months: 1,
            listed_price_tokens: Some(GIFT_PRICE_SENTINEL),
            active_trade_id: None,
            payment_ref: "pay_1".to_string(),
            created_at: Utc::now(),
            transferred_at: None,
            redeemed_at: None,
        };
        assert_eq!(ticket.public_price(), Some(0));
    }
}
