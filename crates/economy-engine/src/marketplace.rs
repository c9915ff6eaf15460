//! Marketplace Ticket Lifecycle: OWNED -> LISTED -> LOCKED_IN_TRADE ->
//! REDEEMED (terminal) with CANCELLED unwinding back to OWNED. Tickets are
//! minted only from confirmed payments and never physically deleted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use economy_core::types::ticket::GIFT_PRICE_SENTINEL;
use economy_core::types::{MarketplaceTicket, TicketStatus};
use economy_core::{math, EconomyError, Result};
use economy_db::models::{DbTicket, DbTicketTransfer, MetricsDelta};
use economy_db::repositories::{TicketRepository, TicketTransferRepository};
use economy_db::DatabasePool;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ledger::record_daily_metrics;
use crate::profiles;

/// Retry budget for must-eventually-succeed profile writes that follow an
/// irreversible ticket-row write.
const FOLLOWUP_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct MintOutcome {
    pub ticket: MarketplaceTicket,
    /// True when the payment ref had already minted a ticket and the
    /// existing one was returned instead.
    pub already_minted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedeemOutcome {
    pub ticket_id: Uuid,
    pub new_subscription_expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub ticket_id: Uuid,
    pub price_tokens: i64,
    pub burned_tokens: i64,
    pub seller_proceeds: i64,
}

pub struct Marketplace {
    pool: Arc<DatabasePool>,
}

impl Marketplace {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Mint a ticket for a confirmed payment. Idempotent on `payment_ref`:
    /// a replayed webhook gets the originally minted ticket back.
    pub async fn mint_for_payment(&self, owner: Uuid, payment_ref: &str) -> Result<MintOutcome> {
        if payment_ref.is_empty() {
            return Err(EconomyError::Validation(
                "payment_ref must not be empty".to_string(),
            ));
        }
        profiles::ensure_exists(self.pool.inner(), owner).await?;

        let now = Utc::now();
        let row = DbTicket::minted(owner, payment_ref.to_string(), now);
        let inserted = TicketRepository::insert_minted(self.pool.inner(), &row).await?;

        if !inserted {
            let existing = TicketRepository::get_by_payment_ref(self.pool.inner(), payment_ref)
                .await?
                .ok_or_else(|| {
                    EconomyError::Database(format!(
                        "payment_ref {payment_ref} conflicted but no ticket row found"
                    ))
                })?;
            info!(payment_ref, "Ticket already minted for payment");
            return Ok(MintOutcome {
                ticket: existing.into_ticket()?,
                already_minted: true,
            });
        }

        // The ticket row is the irreversible write; the owned-set update
        // must eventually succeed behind it.
        let ticket_id = row.ticket_id;
        profiles::update_guarded(self.pool.inner(), owner, FOLLOWUP_ATTEMPTS, |state| {
            state.owned_ticket_ids.insert(ticket_id);
            Ok(())
        })
        .await?;

        economy_metrics::counters::tickets_minted(1);
        record_daily_metrics(
            &self.pool,
            MetricsDelta {
                tickets_minted: 1,
                ..Default::default()
            },
        );
        info!(owner = %owner, ticket = %ticket_id, payment_ref, "Ticket minted");

        Ok(MintOutcome {
            ticket: row.into_ticket()?,
            already_minted: false,
        })
    }

    /// List an OWNED ticket for sale. Price 0 is a gift listing, stored as
    /// the internal sentinel so it stays distinguishable from "not listed".
    pub async fn list_for_trade(
        &self,
        ticket_id: Uuid,
        seller: Uuid,
        price_tokens: i64,
    ) -> Result<MarketplaceTicket> {
        if price_tokens < 0 {
            return Err(EconomyError::Validation(format!(
                "price must be >= 0, got {price_tokens}"
            )));
        }
        let row = TicketRepository::get(self.pool.inner(), ticket_id)
            .await?
            .ok_or(EconomyError::TicketNotFound(ticket_id))?;
        let ticket = row.into_ticket()?;
        if ticket.owner_user_id != seller {
            return Err(EconomyError::Validation(
                "only the owner can list a ticket".to_string(),
            ));
        }
        if !ticket.status.can_list() {
            return Err(EconomyError::InvalidStateTransition(format!(
                "ticket cannot be listed from {}",
                ticket.status.as_str()
            )));
        }

        let stored_price = if price_tokens == 0 {
            GIFT_PRICE_SENTINEL
        } else {
            price_tokens
        };
        let updated =
            TicketRepository::list_for_trade(self.pool.inner(), ticket_id, seller, stored_price)
                .await?;
        if !updated {
            economy_metrics::counters::cas_conflicts("ticket");
            return Err(EconomyError::ConcurrentModification("ticket"));
        }

        info!(ticket = %ticket_id, seller = %seller, price = price_tokens, "Ticket listed");
        let row = TicketRepository::get(self.pool.inner(), ticket_id)
            .await?
            .ok_or(EconomyError::TicketNotFound(ticket_id))?;
        row.into_ticket().map_err(Into::into)
    }

    /// Redeem a ticket for 30 days of premium time. Single-shot: the
    /// `redeemed_at IS NULL` store guard makes a second redeem impossible,
    /// and redemptions stack onto the later of (current expiry, now).
    pub async fn redeem(&self, ticket_id: Uuid, owner: Uuid) -> Result<RedeemOutcome> {
        let row = TicketRepository::get(self.pool.inner(), ticket_id)
            .await?
            .ok_or(EconomyError::TicketNotFound(ticket_id))?;
        let ticket = row.into_ticket()?;
        if ticket.owner_user_id != owner {
            return Err(EconomyError::Validation(
                "only the owner can redeem a ticket".to_string(),
            ));
        }
        if !ticket.status.can_redeem() {
            return Err(EconomyError::InvalidStateTransition(format!(
                "ticket cannot be redeemed from {}",
                ticket.status.as_str()
            )));
        }

        let now = Utc::now();
        let redeemed = TicketRepository::redeem(self.pool.inner(), ticket_id, owner, now).await?;
        if !redeemed {
            economy_metrics::counters::cas_conflicts("ticket");
            return Err(EconomyError::ConcurrentModification("ticket"));
        }

        // Redemption stacks rather than overlap-wastes.
        let months = i64::from(ticket.redeem_value_months);
        let state =
            profiles::update_guarded(self.pool.inner(), owner, FOLLOWUP_ATTEMPTS, |state| {
                let base = match state.subscription_expiry {
                    Some(expiry) if expiry > now => expiry,
                    _ => now,
                };
                state.subscription_expiry = Some(base + Duration::days(30 * months));
                state.owned_ticket_ids.remove(&ticket_id);
                Ok(())
            })
            .await?;

        economy_metrics::counters::tickets_redeemed(1);
        record_daily_metrics(
            &self.pool,
            MetricsDelta {
                tickets_redeemed: 1,
                ..Default::default()
            },
        );
        let new_expiry = state.subscription_expiry.unwrap_or(now);
        info!(ticket = %ticket_id, owner = %owner, expiry = %new_expiry, "Ticket redeemed");

        Ok(RedeemOutcome {
            ticket_id,
            new_subscription_expiry: new_expiry,
        })
    }

    /// Direct purchase of a LISTED ticket at its listed price. The caller
    /// may pass the price it saw; a mismatch (the listing changed underneath
    /// it) is rejected rather than silently charging a different amount.
    pub async fn buy_listed(
        &self,
        ticket_id: Uuid,
        buyer: Uuid,
        expected_price: Option<i64>,
    ) -> Result<PurchaseOutcome> {
        let row = TicketRepository::get(self.pool.inner(), ticket_id)
            .await?
            .ok_or(EconomyError::TicketNotFound(ticket_id))?;
        let ticket = row.into_ticket()?;
        let seller = ticket.owner_user_id;
        if seller == buyer {
            return Err(EconomyError::Validation(
                "cannot buy your own ticket".to_string(),
            ));
        }
        if ticket.status != TicketStatus::Listed || ticket.active_trade_id.is_some() {
            return Err(EconomyError::InvalidStateTransition(
                "ticket is not openly listed".to_string(),
            ));
        }
        let price = ticket.public_price().unwrap_or(0);
        if let Some(expected) = expected_price {
            if expected != price {
                return Err(EconomyError::Validation(format!(
                    "listing price is {price}, not {expected}"
                )));
            }
        }

        profiles::ensure_exists(self.pool.inner(), buyer).await?;

        // Debit first; if the listing disappears between the debit and the
        // ticket write, the debit is refunded.
        if price > 0 {
            profiles::update_guarded(self.pool.inner(), buyer, 1, |state| {
                let available = state.available_balance();
                if price > available {
                    return Err(EconomyError::InsufficientFunds {
                        needed: price,
                        available,
                    });
                }
                state.token_balance -= price;
                Ok(())
            })
            .await?;
        }

        let now = Utc::now();
        let moved =
            TicketRepository::transfer_listed(self.pool.inner(), ticket_id, seller, buyer, now)
                .await?;
        if !moved {
            if price > 0 {
                let refund =
                    profiles::update_guarded(self.pool.inner(), buyer, FOLLOWUP_ATTEMPTS, |state| {
                        state.token_balance += price;
                        Ok(())
                    })
                    .await;
                if let Err(e) = refund {
                    warn!(buyer = %buyer, price, error = %e, "Failed to refund lost purchase");
                }
            }
            economy_metrics::counters::cas_conflicts("ticket");
            return Err(EconomyError::ConcurrentModification("ticket"));
        }

        // Ownership moved: all follow-up writes must eventually succeed.
        let burn = math::marketplace_burn(price);
        let proceeds = price - burn;

        profiles::update_guarded(self.pool.inner(), buyer, FOLLOWUP_ATTEMPTS, |state| {
            state.owned_ticket_ids.insert(ticket_id);
            Ok(())
        })
        .await?;
        profiles::update_guarded(self.pool.inner(), seller, FOLLOWUP_ATTEMPTS, |state| {
            state.owned_ticket_ids.remove(&ticket_id);
            if proceeds > 0 {
                state.token_balance += proceeds;
            }
            Ok(())
        })
        .await?;

        let audit = DbTicketTransfer::new(ticket_id, seller, buyer, None, price, now);
        TicketTransferRepository::insert(self.pool.inner(), &audit).await?;

        if burn > 0 {
            economy_metrics::counters::tokens_burned(burn as u64);
        }
        record_daily_metrics(
            &self.pool,
            MetricsDelta {
                tokens_burned: burn,
                ..Default::default()
            },
        );
        info!(
            ticket = %ticket_id,
            buyer = %buyer,
            seller = %seller,
            price,
            burn,
            "Listed ticket purchased"
        );

        Ok(PurchaseOutcome {
            ticket_id,
            price_tokens: price,
            burned_tokens: burn,
            seller_proceeds: proceeds,
        })
    }
}
