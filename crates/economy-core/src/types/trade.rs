use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeState {
    Draft,
    SellerConfirmed,
    BuyerConfirmed,
    ReadyToSettle,
    Settled,
    Cancelled,
    Expired,
}

impl TradeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeState::Draft => "draft",
            TradeState::SellerConfirmed => "seller_confirmed",
            TradeState::BuyerConfirmed => "buyer_confirmed",
            TradeState::ReadyToSettle => "ready_to_settle",
            TradeState::Settled => "settled",
            TradeState::Cancelled => "cancelled",
            TradeState::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<TradeState> {
        match s {
            "draft" => Some(TradeState::Draft),
            "seller_confirmed" => Some(TradeState::SellerConfirmed),
            "buyer_confirmed" => Some(TradeState::BuyerConfirmed),
            "ready_to_settle" => Some(TradeState::ReadyToSettle),
            "settled" => Some(TradeState::Settled),
            "cancelled" => Some(TradeState::Cancelled),
            "expired" => Some(TradeState::Expired),
            _ => None,
        }
    }

    /// Open states hold ticket locks and (after buyer confirmation) a token
    /// reservation; terminal states hold neither.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TradeState::Draft
                | TradeState::SellerConfirmed
                | TradeState::BuyerConfirmed
                | TradeState::ReadyToSettle
        )
    }

    pub fn can_cancel(&self) -> bool {
        self.is_open() && *self != TradeState::ReadyToSettle
    }

    /// State after one side confirms from `current`.
    pub fn after_confirmation(current: TradeState, seller: bool) -> Option<TradeState> {
        match (current, seller) {
            (TradeState::Draft, true) => Some(TradeState::SellerConfirmed),
            (TradeState::Draft, false) => Some(TradeState::BuyerConfirmed),
            (TradeState::BuyerConfirmed, true) => Some(TradeState::ReadyToSettle),
            (TradeState::SellerConfirmed, false) => Some(TradeState::ReadyToSettle),
            _ => None,
        }
    }
}

/// A proposed bilateral exchange of tickets for tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub ticket_ids: Vec<Uuid>,
    pub price_tokens: i64,
    pub state: TradeState,
    pub seller_confirmed_at: Option<DateTime<Utc>>,
    pub buyer_confirmed_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// `ready_to_settle` requires both confirmation timestamps.
    pub fn ready_for_settlement(&self) -> bool {
        self.state == TradeState::ReadyToSettle
            && self.seller_confirmed_at.is_some()
            && self.buyer_confirmed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_transitions() {
        assert_eq!(
            TradeState::after_confirmation(TradeState::Draft, true),
            Some(TradeState::SellerConfirmed)
        );
        assert_eq!(
            TradeState::after_confirmation(TradeState::Draft, false),
            Some(TradeState::BuyerConfirmed)
        );
        assert_eq!(
            TradeState::after_confirmation(TradeState::SellerConfirmed, false),
            Some(TradeState::ReadyToSettle)
        );
        assert_eq!(
            TradeState::after_confirmation(TradeState::BuyerConfirmed, true),
            Some(TradeState::ReadyToSettle)
        );
        // Double-confirming the same side is not a transition.
        assert_eq!(
            TradeState::after_confirmation(TradeState::SellerConfirmed, true),
            None
        );
        assert_eq!(
            TradeState::after_confirmation(TradeState::Settled, false),
            None
        );
    }

    #[test]
    fn cancel_window_closes_at_ready_to_settle() {
        assert!(TradeState::Draft.can_cancel());
        assert!(TradeState::BuyerConfirmed.can_cancel());
        assert!(!TradeState::ReadyToSettle.can_cancel());
        assert!(!TradeState::Settled.can_cancel());
    }
}
