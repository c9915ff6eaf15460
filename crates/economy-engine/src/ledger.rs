//! Economy Ledger: the sole authority for token balances and inventories.

use std::sync::Arc;

use chrono::Utc;
use economy_core::types::{Rarity, UserEconomyState};
use economy_core::{CatalogStore, EconomyError, Result};
use economy_db::models::MetricsDelta;
use economy_db::repositories::DailyMetricsRepository;
use economy_db::DatabasePool;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::profiles;

/// Record a daily-metrics delta without blocking or failing the caller.
/// Failures are diagnostic, not correctness-critical, but must stay visible.
pub(crate) fn record_daily_metrics(pool: &DatabasePool, delta: MetricsDelta) {
    if delta.is_empty() {
        return;
    }
    let pool = pool.inner().clone();
    tokio::spawn(async move {
        let today = Utc::now().date_naive();
        if let Err(e) = DailyMetricsRepository::increment(&pool, today, &delta).await {
            warn!(error = %e, "Daily metrics upsert failed");
            economy_metrics::counters::daily_metrics_failures(1);
        }
    });
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub token_balance: i64,
    pub reserved_token_balance: i64,
    pub available_balance: i64,
}

/// Which inventory subset a sell operation targets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellSelection {
    Quantity { item_id: String, quantity: i64 },
    Category { rarity: Rarity },
    All,
}

#[derive(Debug, Clone, Serialize)]
pub struct SoldItem {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_value: i64,
    pub subtotal: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellOutcome {
    pub items_sold: i64,
    pub tokens_earned: i64,
    pub breakdown: Vec<SoldItem>,
    pub new_balance: i64,
}

/// Resolve a sell selection against held inventory and catalog values.
/// Pure over (catalog, state); proceeds are exactly
/// `sum(score_value * quantity)` over the returned plan.
fn plan_sale(
    catalog: &CatalogStore,
    state: &UserEconomyState,
    selection: &SellSelection,
) -> Result<Vec<SoldItem>> {
    let mut plan = Vec::new();
    match selection {
        SellSelection::Quantity { item_id, quantity } => {
            if *quantity <= 0 {
                return Err(EconomyError::InvalidQuantity(*quantity));
            }
            let held = state.inventory.get(item_id).copied().unwrap_or(0);
            if *quantity > held {
                return Err(EconomyError::InvalidQuantity(*quantity));
            }
            let item = catalog
                .get(item_id)
                .ok_or_else(|| EconomyError::ItemNotFound(item_id.clone()))?;
            plan.push(SoldItem {
                item_id: item.id,
                name: item.name,
                quantity: *quantity,
                unit_value: item.score_value,
                subtotal: item.score_value * quantity,
            });
        }
        SellSelection::Category { rarity } => {
            plan_bulk(catalog, state, &mut plan, Some(*rarity))?;
            if plan.is_empty() {
                return Err(EconomyError::NoMatchingItems);
            }
        }
        SellSelection::All => {
            plan_bulk(catalog, state, &mut plan, None)?;
            if plan.is_empty() {
                return Err(EconomyError::NoMatchingItems);
            }
        }
    }
    Ok(plan)
}

fn plan_bulk(
    catalog: &CatalogStore,
    state: &UserEconomyState,
    plan: &mut Vec<SoldItem>,
    rarity: Option<Rarity>,
) -> Result<()> {
    // Inventory referencing items missing from the catalog is corrupt
    // persisted data and fails the sale rather than silently skipping.
    for (item_id, held) in &state.inventory {
        let item = catalog
            .get(item_id)
            .ok_or_else(|| EconomyError::ItemNotFound(item_id.clone()))?;
        if let Some(wanted) = rarity {
            if item.rarity != wanted {
                continue;
            }
        }
        plan.push(SoldItem {
            item_id: item.id,
            name: item.name,
            quantity: *held,
            unit_value: item.score_value,
            subtotal: item.score_value * held,
        });
    }
    Ok(())
}

pub struct Ledger {
    pool: Arc<DatabasePool>,
    catalog: Arc<CatalogStore>,
}

impl Ledger {
    pub fn new(pool: Arc<DatabasePool>, catalog: Arc<CatalogStore>) -> Self {
        Self { pool, catalog }
    }

    pub async fn ensure_profile(&self, user_id: Uuid) -> Result<()> {
        profiles::ensure_exists(self.pool.inner(), user_id).await
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<BalanceView> {
        let (state, _) = profiles::load(self.pool.inner(), user_id).await?;
        Ok(BalanceView {
            token_balance: state.token_balance,
            reserved_token_balance: state.reserved_token_balance,
            available_balance: state.available_balance(),
        })
    }

    /// Mint `amount` tokens into the user's balance.
    pub async fn add_tokens(&self, user_id: Uuid, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(EconomyError::Validation(format!(
                "add_tokens amount must be positive, got {amount}"
            )));
        }
        let state = profiles::update_guarded(self.pool.inner(), user_id, 1, |state| {
            state.token_balance += amount;
            Ok(())
        })
        .await?;

        economy_metrics::counters::tokens_minted(amount as u64);
        record_daily_metrics(&self.pool, MetricsDelta::tokens_generated(amount));
        info!(user = %user_id, amount, balance = state.token_balance, "Tokens added");
        Ok(state.token_balance)
    }

    /// Burn `amount` tokens from the user's available balance.
    pub async fn burn_tokens(&self, user_id: Uuid, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(EconomyError::Validation(format!(
                "burn_tokens amount must be positive, got {amount}"
            )));
        }
        let state = profiles::update_guarded(self.pool.inner(), user_id, 1, |state| {
            let available = state.available_balance();
            if amount > available {
                return Err(EconomyError::InsufficientFunds {
                    needed: amount,
                    available,
                });
            }
            state.token_balance -= amount;
            Ok(())
        })
        .await?;

        economy_metrics::counters::tokens_burned(amount as u64);
        record_daily_metrics(&self.pool, MetricsDelta::tokens_burned(amount));
        info!(user = %user_id, amount, balance = state.token_balance, "Tokens burned");
        Ok(state.token_balance)
    }

    /// Sell a subset of the inventory back to the bank. All-or-nothing: the
    /// whole selection applies under one conditional write or none of it does.
    pub async fn sell(&self, user_id: Uuid, selection: SellSelection) -> Result<SellOutcome> {
        let (state, version) = profiles::load(self.pool.inner(), user_id).await?;
        let plan = plan_sale(&self.catalog, &state, &selection)?;

        let mut new_state = state;
        for sold in &plan {
            let held = new_state.inventory.get(&sold.item_id).copied().unwrap_or(0);
            let remaining = held - sold.quantity;
            if remaining > 0 {
                new_state.inventory.insert(sold.item_id.clone(), remaining);
            } else {
                new_state.inventory.remove(&sold.item_id);
            }
        }
        let items_sold: i64 = plan.iter().map(|s| s.quantity).sum();
        let tokens_earned: i64 = plan.iter().map(|s| s.subtotal).sum();
        new_state.current_items_owned -= items_sold;
        new_state.token_balance += tokens_earned;

        profiles::store(self.pool.inner(), &new_state, version).await?;

        economy_metrics::counters::items_sold(items_sold as u64);
        economy_metrics::counters::tokens_minted(tokens_earned as u64);
        record_daily_metrics(
            &self.pool,
            MetricsDelta {
                tokens_generated: tokens_earned,
                items_sold,
                ..Default::default()
            },
        );
        info!(user = %user_id, items_sold, tokens_earned, "Inventory sold");

        Ok(SellOutcome {
            items_sold,
            tokens_earned,
            breakdown: plan,
            new_balance: new_state.token_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use economy_core::types::Item;

    fn catalog() -> CatalogStore {
        let store = CatalogStore::new();
        store.load(vec![
            Item {
                id: "pearl".to_string(),
                name: "Pearl".to_string(),
                rarity: Rarity::Common,
                score_value: 5,
                image_url: None,
            },
            Item {
                id: "shell".to_string(),
                name: "Shell".to_string(),
                rarity: Rarity::Common,
                score_value: 2,
                image_url: None,
            },
            Item {
                id: "crown".to_string(),
                name: "Crown".to_string(),
                rarity: Rarity::Rare,
                score_value: 90,
                image_url: None,
            },
        ]);
        store
    }

    fn state_with(inventory: &[(&str, i64)]) -> UserEconomyState {
        let mut state = UserEconomyState::new(Uuid::new_v4());
        for (id, qty) in inventory {
            state.inventory.insert(id.to_string(), *qty);
        }
        state
    }

    #[test]
    fn quantity_sale_conserves_value() {
        let catalog = catalog();
        let state = state_with(&[("pearl", 4)]);

        let plan = plan_sale(
            &catalog,
            &state,
            &SellSelection::Quantity {
                item_id: "pearl".to_string(),
                quantity: 3,
            },
        )
        .expect("plan");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity, 3);
        assert_eq!(plan[0].subtotal, 15);
    }

    #[test]
    fn rejects_overdrawn_or_nonpositive_quantity() {
        let catalog = catalog();
        let state = state_with(&[("pearl", 2)]);

        let err = plan_sale(
            &catalog,
            &state,
            &SellSelection::Quantity {
                item_id: "pearl".to_string(),
                quantity: 3,
            },
        )
        .expect_err("overdrawn");
        assert!(matches!(err, EconomyError::InvalidQuantity(3)));

        let err = plan_sale(
            &catalog,
            &state,
            &SellSelection::Quantity {
                item_id: "pearl".to_string(),
                quantity: 0,
            },
        )
        .expect_err("zero");
        assert!(matches!(err, EconomyError::InvalidQuantity(0)));
    }

    #[test]
    fn category_sale_selects_only_matching_rarity() {
        let catalog = catalog();
        let state = state_with(&[("pearl", 2), ("shell", 1), ("crown", 1)]);

        let plan = plan_sale(
            &catalog,
            &state,
            &SellSelection::Category {
                rarity: Rarity::Common,
            },
        )
        .expect("plan");
        assert_eq!(plan.len(), 2);
        let total: i64 = plan.iter().map(|s| s.subtotal).sum();
        assert_eq!(total, 2 * 5 + 1 * 2);
    }

    #[test]
    fn empty_category_is_no_matching_items() {
        let catalog = catalog();
        let state = state_with(&[("pearl", 2)]);

        let err = plan_sale(
            &catalog,
            &state,
            &SellSelection::Category {
                rarity: Rarity::Mythic,
            },
        )
        .expect_err("nothing mythic held");
        assert!(matches!(err, EconomyError::NoMatchingItems));

        let empty = UserEconomyState::new(Uuid::new_v4());
        let err = plan_sale(&catalog, &empty, &SellSelection::All).expect_err("empty inventory");
        assert!(matches!(err, EconomyError::NoMatchingItems));
    }

    #[test]
    fn sell_all_covers_whole_inventory() {
        let catalog = catalog();
        let state = state_with(&[("pearl", 3), ("crown", 2)]);

        let plan = plan_sale(&catalog, &state, &SellSelection::All).expect("plan");
        let items: i64 = plan.iter().map(|s| s.quantity).sum();
        let total: i64 = plan.iter().map(|s| s.subtotal).sum();
        assert_eq!(items, 5);
        assert_eq!(total, 3 * 5 + 2 * 90);
    }

    #[test]
    fn unknown_inventory_item_fails_loudly() {
        let catalog = catalog();
        let state = state_with(&[("ghost", 1)]);

        let err = plan_sale(&catalog, &state, &SellSelection::All).expect_err("unknown item");
        assert!(matches!(err, EconomyError::ItemNotFound(_)));
    }
}
