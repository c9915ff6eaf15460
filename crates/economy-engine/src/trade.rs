//! Trade Settlement State Machine.
//!
//! draft -> {seller_confirmed | buyer_confirmed} -> ready_to_settle ->
//! settled, with cancelled/expired reachable from open states. Buyer tokens
//! are reserved at confirmation and either move at settlement or release on
//! cancel/expiry. Settlement is one ordered algorithm: the trade-state
//! transition is the first irreversible write; everything after it is
//! retried until it lands, never rolled back.

use std::sync::Arc;

use chrono::{Duration, Utc};
use economy_core::types::{TicketStatus, Trade, TradeState};
use economy_core::{math, EconomyConfig, EconomyError, Result};
use economy_db::models::{DbTicketTransfer, DbTrade, MetricsDelta};
use economy_db::repositories::{
    IdempotencyRepository, TicketRepository, TradeRepository, TicketTransferRepository,
};
use economy_db::DatabasePool;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ledger::record_daily_metrics;
use crate::profiles;

const SETTLE_OPERATION: &str = "trade_settle";
const FOLLOWUP_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub trade_id: Uuid,
    pub state: TradeState,
    pub price_tokens: i64,
    pub burned_tokens: i64,
    pub seller_proceeds: i64,
    pub tickets_transferred: Vec<Uuid>,
    /// True when this response was served from the idempotency record of a
    /// previously completed settlement.
    pub idempotent: bool,
}

pub struct TradeEngine {
    pool: Arc<DatabasePool>,
    config: Arc<EconomyConfig>,
}

impl TradeEngine {
    pub fn new(pool: Arc<DatabasePool>, config: Arc<EconomyConfig>) -> Self {
        Self { pool, config }
    }

    async fn load(&self, trade_id: Uuid) -> Result<Trade> {
        let row = TradeRepository::get(self.pool.inner(), trade_id)
            .await?
            .ok_or(EconomyError::TradeNotFound(trade_id))?;
        row.into_trade().map_err(Into::into)
    }

    /// Create a draft trade and take the exclusive ticket locks.
    pub async fn create_trade(
        &self,
        seller: Uuid,
        buyer: Uuid,
        ticket_ids: Vec<Uuid>,
        price_tokens: i64,
    ) -> Result<Trade> {
        if ticket_ids.is_empty() {
            return Err(EconomyError::Validation(
                "a trade needs at least one ticket".to_string(),
            ));
        }
        if price_tokens < 0 {
            return Err(EconomyError::Validation(format!(
                "price must be >= 0, got {price_tokens}"
            )));
        }
        if seller == buyer {
            return Err(EconomyError::Validation(
                "seller and buyer must differ".to_string(),
            ));
        }

        let rows = TicketRepository::get_many(self.pool.inner(), &ticket_ids).await?;
        if rows.len() != ticket_ids.len() {
            return Err(EconomyError::Validation(
                "trade references unknown tickets".to_string(),
            ));
        }
        for row in rows {
            let ticket = row.into_ticket()?;
            if ticket.owner_user_id != seller {
                return Err(EconomyError::Validation(format!(
                    "seller does not own ticket {}",
                    ticket.ticket_id
                )));
            }
            let lockable = ticket.active_trade_id.is_none()
                && matches!(ticket.status, TicketStatus::Owned | TicketStatus::Listed);
            if !lockable {
                return Err(EconomyError::InvalidStateTransition(format!(
                    "ticket {} is not available for trading",
                    ticket.ticket_id
                )));
            }
        }

        let now = Utc::now();
        let trade_id = Uuid::new_v4();
        let expires_at = now + Duration::hours(self.config.trade_expiry_hours);
        let row = DbTrade::draft(
            trade_id,
            seller,
            buyer,
            &ticket_ids,
            price_tokens,
            expires_at,
            now,
        );
        TradeRepository::insert(self.pool.inner(), &row).await?;

        // Take the locks one conditional write at a time; losing any of them
        // means another trade raced us, so unwind and report the conflict.
        let mut locked = Vec::new();
        for ticket_id in &ticket_ids {
            let ok =
                TicketRepository::lock_to_trade(self.pool.inner(), *ticket_id, seller, trade_id)
                    .await?;
            if !ok {
                for unlock_id in &locked {
                    let _ =
                        TicketRepository::unlock_from_trade(self.pool.inner(), *unlock_id, trade_id)
                            .await;
                }
                let _ = TradeRepository::mark_cancelled(self.pool.inner(), trade_id, now).await;
                economy_metrics::counters::cas_conflicts("ticket");
                return Err(EconomyError::ConcurrentModification("ticket"));
            }
            locked.push(*ticket_id);
        }

        info!(
            trade = %trade_id,
            seller = %seller,
            buyer = %buyer,
            tickets = ticket_ids.len(),
            price = price_tokens,
            "Trade created"
        );
        self.load(trade_id).await
    }

    pub async fn confirm_seller(&self, trade_id: Uuid, seller: Uuid) -> Result<Trade> {
        let trade = self.load(trade_id).await?;
        if trade.seller_id != seller {
            return Err(EconomyError::Validation(
                "only the seller can confirm this side".to_string(),
            ));
        }
        let next = TradeState::after_confirmation(trade.state, true).ok_or_else(|| {
            EconomyError::InvalidStateTransition(format!(
                "cannot confirm seller from {}",
                trade.state.as_str()
            ))
        })?;

        let ok = TradeRepository::confirm(
            self.pool.inner(),
            trade_id,
            trade.state.as_str(),
            next.as_str(),
            true,
            Utc::now(),
        )
        .await?;
        if !ok {
            economy_metrics::counters::cas_conflicts("trade");
            return Err(EconomyError::ConcurrentModification("trade"));
        }
        info!(trade = %trade_id, state = next.as_str(), "Seller confirmed");
        self.load(trade_id).await
    }

    /// Buyer confirmation reserves the price out of the available balance
    /// before the state advances; the reservation is released if the state
    /// write loses its race.
    pub async fn confirm_buyer(&self, trade_id: Uuid, buyer: Uuid) -> Result<Trade> {
        let trade = self.load(trade_id).await?;
        if trade.buyer_id != buyer {
            return Err(EconomyError::Validation(
                "only the buyer can confirm this side".to_string(),
            ));
        }
        let next = TradeState::after_confirmation(trade.state, false).ok_or_else(|| {
            EconomyError::InvalidStateTransition(format!(
                "cannot confirm buyer from {}",
                trade.state.as_str()
            ))
        })?;

        let price = trade.price_tokens;
        if price > 0 {
            profiles::update_guarded(self.pool.inner(), buyer, 1, |state| {
                let available = state.available_balance();
                if price > available {
                    return Err(EconomyError::InsufficientFunds {
                        needed: price,
                        available,
                    });
                }
                state.reserved_token_balance += price;
                Ok(())
            })
            .await?;
        }

        let ok = TradeRepository::confirm(
            self.pool.inner(),
            trade_id,
            trade.state.as_str(),
            next.as_str(),
            false,
            Utc::now(),
        )
        .await?;
        if !ok {
            if price > 0 {
                release_reservation(&self.pool, buyer, price).await;
            }
            economy_metrics::counters::cas_conflicts("trade");
            return Err(EconomyError::ConcurrentModification("trade"));
        }
        info!(trade = %trade_id, state = next.as_str(), reserved = price, "Buyer confirmed");
        self.load(trade_id).await
    }

    /// Settle a ready trade. Safe to call any number of times with the same
    /// idempotency key: the first completed settlement's response is stored
    /// and replayed verbatim.
    pub async fn settle(&self, trade_id: Uuid, idempotency_key: &str) -> Result<SettlementOutcome> {
        if idempotency_key.trim().is_empty() {
            return Err(EconomyError::Validation(
                "idempotency key is required".to_string(),
            ));
        }

        // A prior completed settlement under this key short-circuits.
        if let Some(record) =
            IdempotencyRepository::get(self.pool.inner(), idempotency_key).await?
        {
            let mut outcome: SettlementOutcome = serde_json::from_value(record.response)
                .map_err(|e| EconomyError::Corrupt {
                    entity: "idempotency_record.response",
                    reason: e.to_string(),
                })?;
            outcome.idempotent = true;
            info!(trade = %trade_id, key = idempotency_key, "Settlement replayed from idempotency record");
            return Ok(outcome);
        }

        let trade = self.load(trade_id).await?;
        if trade.state == TradeState::Settled {
            return Err(EconomyError::AlreadyProcessed(format!(
                "trade {trade_id} is already settled"
            )));
        }
        if !trade.ready_for_settlement() {
            return Err(EconomyError::InvalidStateTransition(format!(
                "trade is {} and cannot settle",
                trade.state.as_str()
            )));
        }

        // Verify the ticket locks are intact before committing.
        let rows = TicketRepository::get_many(self.pool.inner(), &trade.ticket_ids).await?;
        if rows.len() != trade.ticket_ids.len() {
            return Err(EconomyError::InvalidStateTransition(
                "trade tickets are missing".to_string(),
            ));
        }
        for row in rows {
            let ticket = row.into_ticket()?;
            if !ticket.is_locked_to(trade_id) {
                return Err(EconomyError::InvalidStateTransition(format!(
                    "ticket {} is no longer locked to this trade",
                    ticket.ticket_id
                )));
            }
        }

        // Verify the buyer's reservation still covers the price.
        let price = trade.price_tokens;
        if price > 0 {
            let (buyer_state, _) = profiles::load(self.pool.inner(), trade.buyer_id).await?;
            if buyer_state.reserved_token_balance < price {
                return Err(EconomyError::InvalidStateTransition(
                    "buyer reservation no longer covers the price".to_string(),
                ));
            }
        }

        // First irreversible write: exactly one settlement attempt wins the
        // ready_to_settle -> settled transition.
        let now = Utc::now();
        if !TradeRepository::mark_settled(self.pool.inner(), trade_id, now).await? {
            economy_metrics::counters::cas_conflicts("trade");
            return Err(EconomyError::ConcurrentModification("trade"));
        }

        // From here on every step must eventually succeed; a failure after
        // the transition is retried, never rolled back.
        let burn = math::marketplace_burn(price);
        let proceeds = price - burn;

        let ticket_ids = trade.ticket_ids.clone();
        profiles::update_guarded(
            self.pool.inner(),
            trade.buyer_id,
            FOLLOWUP_ATTEMPTS,
            |state| {
                if price > 0 {
                    state.token_balance -= price;
                    state.reserved_token_balance =
                        (state.reserved_token_balance - price).max(0);
                }
                for ticket_id in &ticket_ids {
                    state.owned_ticket_ids.insert(*ticket_id);
                }
                Ok(())
            },
        )
        .await
        .map_err(|e| settlement_tear(trade_id, "buyer balance", e))?;

        profiles::update_guarded(
            self.pool.inner(),
            trade.seller_id,
            FOLLOWUP_ATTEMPTS,
            |state| {
                if proceeds > 0 {
                    state.token_balance += proceeds;
                }
                for ticket_id in &ticket_ids {
                    state.owned_ticket_ids.remove(ticket_id);
                }
                Ok(())
            },
        )
        .await
        .map_err(|e| settlement_tear(trade_id, "seller balance", e))?;

        for ticket_id in &trade.ticket_ids {
            let moved = TicketRepository::transfer_locked(
                self.pool.inner(),
                *ticket_id,
                trade_id,
                trade.buyer_id,
                now,
            )
            .await?;
            if !moved {
                return Err(settlement_tear(
                    trade_id,
                    "ticket transfer",
                    EconomyError::ConcurrentModification("ticket"),
                ));
            }
            let audit = DbTicketTransfer::new(
                *ticket_id,
                trade.seller_id,
                trade.buyer_id,
                Some(trade_id),
                price,
                now,
            );
            TicketTransferRepository::insert(self.pool.inner(), &audit).await?;
        }

        let outcome = SettlementOutcome {
            trade_id,
            state: TradeState::Settled,
            price_tokens: price,
            burned_tokens: burn,
            seller_proceeds: proceeds,
            tickets_transferred: trade.ticket_ids.clone(),
            idempotent: false,
        };

        // Persist the idempotency record last: its presence means the whole
        // settlement completed. Losing the insert race to a concurrent retry
        // with the same key is harmless; the stored response is identical.
        let response = serde_json::to_value(&outcome)
            .map_err(|e| EconomyError::Database(e.to_string()))?;
        IdempotencyRepository::insert(
            self.pool.inner(),
            idempotency_key,
            SETTLE_OPERATION,
            &response,
            now,
        )
        .await?;

        economy_metrics::counters::trades_settled(1);
        if burn > 0 {
            economy_metrics::counters::tokens_burned(burn as u64);
        }
        record_daily_metrics(
            &self.pool,
            MetricsDelta {
                trades_settled: 1,
                tokens_burned: burn,
                ..Default::default()
            },
        );
        info!(
            trade = %trade_id,
            price,
            burn,
            tickets = outcome.tickets_transferred.len(),
            "Trade settled"
        );
        Ok(outcome)
    }

    /// Cancel an open, not-yet-ready trade, releasing locks and reservation.
    pub async fn cancel(&self, trade_id: Uuid, requester: Uuid) -> Result<Trade> {
        let trade = self.load(trade_id).await?;
        if requester != trade.seller_id && requester != trade.buyer_id {
            return Err(EconomyError::Validation(
                "only a trade party can cancel it".to_string(),
            ));
        }
        if !trade.state.can_cancel() {
            return Err(EconomyError::InvalidStateTransition(format!(
                "trade is {} and cannot be cancelled",
                trade.state.as_str()
            )));
        }

        let now = Utc::now();
        if !TradeRepository::mark_cancelled(self.pool.inner(), trade_id, now).await? {
            economy_metrics::counters::cas_conflicts("trade");
            return Err(EconomyError::ConcurrentModification("trade"));
        }

        self.release_trade_holds(&trade).await;
        info!(trade = %trade_id, by = %requester, "Trade cancelled");
        self.load(trade_id).await
    }

    /// Sweep open trades past their expiry: expire, unlock, release.
    pub async fn expire_stale(&self) -> Result<u64> {
        let now = Utc::now();
        let stale = TradeRepository::find_expired(self.pool.inner(), now, 100).await?;
        let mut expired = 0;
        for row in stale {
            let trade = row.into_trade()?;
            if TradeRepository::mark_expired(self.pool.inner(), trade.id, now).await? {
                self.release_trade_holds(&trade).await;
                expired += 1;
                info!(trade = %trade.id, "Stale trade expired");
            }
        }
        if expired > 0 {
            economy_metrics::counters::trades_expired(expired);
        }
        if let Ok(open) = TradeRepository::count_open(self.pool.inner()).await {
            economy_metrics::gauges::open_trades(open as f64);
        }
        Ok(expired)
    }

    /// Unlock the trade's tickets and release the buyer's reservation.
    /// Best-effort follow-up to a terminal state write; failures are logged,
    /// and the reservation release floors at zero to tolerate prior partial
    /// releases.
    async fn release_trade_holds(&self, trade: &Trade) {
        for ticket_id in &trade.ticket_ids {
            if let Err(e) =
                TicketRepository::unlock_from_trade(self.pool.inner(), *ticket_id, trade.id).await
            {
                warn!(trade = %trade.id, ticket = %ticket_id, error = %e, "Failed to unlock ticket");
            }
        }
        if trade.buyer_confirmed_at.is_some() && trade.price_tokens > 0 {
            release_reservation(&self.pool, trade.buyer_id, trade.price_tokens).await;
        }
    }
}

/// Release a buyer reservation, flooring at zero.
async fn release_reservation(pool: &DatabasePool, buyer: Uuid, amount: i64) {
    let result = profiles::update_guarded(pool.inner(), buyer, FOLLOWUP_ATTEMPTS, |state| {
        state.reserved_token_balance = (state.reserved_token_balance - amount).max(0);
        Ok(())
    })
    .await;
    if let Err(e) = result {
        warn!(buyer = %buyer, amount, error = %e, "Failed to release reservation");
    }
}

/// A post-transition settlement step ran out of retries. The trade is
/// already marked settled, so this is an inconsistency to surface loudly.
fn settlement_tear(trade_id: Uuid, step: &str, err: EconomyError) -> EconomyError {
    error!(trade = %trade_id, step, error = %err, "Settlement step failed after state transition");
    EconomyError::Database(format!(
        "settlement of {trade_id} interrupted at {step}: {err}"
    ))
}
