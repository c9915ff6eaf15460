//! Hunt/Automation Engine: a timed session (free or paid) accrues
//! fractional item progress over wall-clock time. Idle -> Running ->
//! Collectible -> Idle; all transitions are gated on the phase derived in
//! `UserEconomyState::hunt_phase`, never re-derived ad hoc.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use economy_core::types::{HuntPhase, Item, Rarity};
use economy_core::{math, CatalogStore, EconomyConfig, EconomyError, Result};
use economy_db::models::MetricsDelta;
use economy_db::DatabasePool;
use rand::thread_rng;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::ledger::record_daily_metrics;
use crate::{profiles, rewards};

#[derive(Debug, Clone, Serialize)]
pub struct HuntStarted {
    pub mode: &'static str,
    pub runtime_minutes: i64,
    pub running_until: DateTime<Utc>,
    pub tokens_spent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HuntStatus {
    pub phase: &'static str,
    pub remaining_secs: i64,
    pub session_runtime_minutes: Option<i32>,
    pub accumulated_progress: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantedItem {
    pub item_id: String,
    pub name: String,
    pub rarity: Rarity,
    pub score_value: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectOutcome {
    pub items_granted: i64,
    pub total_power_gained: i64,
    pub items_received: Vec<GrantedItem>,
}

pub struct HuntEngine {
    pool: Arc<DatabasePool>,
    catalog: Arc<CatalogStore>,
    config: Arc<EconomyConfig>,
}

impl HuntEngine {
    pub fn new(
        pool: Arc<DatabasePool>,
        catalog: Arc<CatalogStore>,
        config: Arc<EconomyConfig>,
    ) -> Self {
        Self {
            pool,
            catalog,
            config,
        }
    }

    pub async fn status(&self, user_id: Uuid) -> Result<HuntStatus> {
        let (state, _) = profiles::load(self.pool.inner(), user_id).await?;
        let now = Utc::now();
        let (phase, remaining_secs) = match state.hunt_phase(now) {
            HuntPhase::Idle => ("idle", 0),
            HuntPhase::Running { until } => ("running", (until - now).num_seconds().max(0)),
            HuntPhase::Collectible { .. } => ("collectible", 0),
        };
        Ok(HuntStatus {
            phase,
            remaining_secs,
            session_runtime_minutes: state.bot_session_runtime_minutes,
            accumulated_progress: state.bot_accumulated_progress,
        })
    }

    /// Start the free session: fixed runtime, zero cost, cooldown-gated.
    pub async fn start_free(&self, user_id: Uuid) -> Result<HuntStarted> {
        let now = Utc::now();
        let cooldown = Duration::hours(self.config.free_hunt_cooldown_hours);
        let runtime = math::FREE_SESSION_MINUTES;
        let until = now + Duration::minutes(runtime);

        profiles::update_guarded(self.pool.inner(), user_id, 1, |state| {
            if state.hunt_phase(now) != HuntPhase::Idle {
                return Err(EconomyError::AlreadyRunning);
            }
            if let Some(last) = state.last_free_run_at {
                let ready_at = last + cooldown;
                if ready_at > now {
                    return Err(EconomyError::CooldownActive {
                        remaining_secs: (ready_at - now).num_seconds(),
                    });
                }
            }
            state.bot_running_until = Some(until);
            state.bot_session_runtime_minutes = Some(runtime as i32);
            state.last_free_run_at = Some(now);
            Ok(())
        })
        .await?;

        economy_metrics::counters::hunts_started("free");
        info!(user = %user_id, runtime_minutes = runtime, "Free hunt started");
        Ok(HuntStarted {
            mode: "free",
            runtime_minutes: runtime,
            running_until: until,
            tokens_spent: 0,
        })
    }

    /// Start a paid session of `minutes`, debiting the cost up front.
    pub async fn start_paid(&self, user_id: Uuid, minutes: i64) -> Result<HuntStarted> {
        let now = Utc::now();
        let until = now + Duration::minutes(minutes);
        let mut cost_charged = 0;

        profiles::update_guarded(self.pool.inner(), user_id, 1, |state| {
            if state.hunt_phase(now) != HuntPhase::Idle {
                return Err(EconomyError::AlreadyRunning);
            }
            let max_minutes = math::max_runtime_minutes(state.bot_runtime_level);
            if minutes < math::MIN_SESSION_MINUTES || minutes > max_minutes {
                return Err(EconomyError::Validation(format!(
                    "runtime must be between {} and {max_minutes} minutes, got {minutes}",
                    math::MIN_SESSION_MINUTES
                )));
            }
            let cost =
                math::paid_session_cost(minutes, math::cost_per_hour(state.cost_per_hour_level));
            let available = state.available_balance();
            if cost > available {
                return Err(EconomyError::InsufficientFunds {
                    needed: cost,
                    available,
                });
            }
            state.token_balance -= cost;
            state.bot_running_until = Some(until);
            state.bot_session_runtime_minutes = Some(minutes as i32);
            cost_charged = cost;
            Ok(())
        })
        .await?;

        economy_metrics::counters::hunts_started("paid");
        economy_metrics::counters::tokens_burned(cost_charged as u64);
        record_daily_metrics(&self.pool, MetricsDelta::tokens_burned(cost_charged));
        info!(
            user = %user_id,
            runtime_minutes = minutes,
            cost = cost_charged,
            "Paid hunt started"
        );
        Ok(HuntStarted {
            mode: "paid",
            runtime_minutes: minutes,
            running_until: until,
            tokens_spent: cost_charged,
        })
    }

    /// Collect a finished session: accrue progress over the *stored* session
    /// runtime, resolve weighted draws, and commit rewards plus the cleared
    /// session in one conditional write.
    pub async fn collect(&self, user_id: Uuid) -> Result<CollectOutcome> {
        let now = Utc::now();
        let (state, version) = profiles::load(self.pool.inner(), user_id).await?;

        match state.hunt_phase(now) {
            HuntPhase::Idle => {
                return Err(EconomyError::InvalidStateTransition(
                    "no hunt session to collect".to_string(),
                ))
            }
            HuntPhase::Running { .. } => return Err(EconomyError::SessionNotComplete),
            HuntPhase::Collectible { .. } => {}
        }

        // The stored runtime, not wall-clock recomputation: rate or runtime
        // upgrades mid-session must not inflate or deflate the reward.
        let minutes = i64::from(state.bot_session_runtime_minutes.unwrap_or(0));
        let rate = math::items_per_hour(state.bot_items_per_hour_level);
        let accrual = math::fractional_accrual(rate, minutes, state.bot_accumulated_progress);

        let mut new_state = state;
        new_state.bot_running_until = None;
        new_state.bot_session_runtime_minutes = None;
        new_state.bot_accumulated_progress = accrual.new_accumulated;

        if accrual.granted == 0 {
            profiles::store(self.pool.inner(), &new_state, version).await?;
            economy_metrics::counters::hunts_collected(1);
            info!(user = %user_id, "Hunt collected with no whole item granted");
            return Ok(CollectOutcome {
                items_granted: 0,
                total_power_gained: 0,
                items_received: Vec::new(),
            });
        }

        let bonus_bp = math::satellite_bonus_bp(new_state.satellite_level);
        let drawn = rewards::draw_items(
            &self.catalog,
            accrual.granted,
            bonus_bp,
            &mut thread_rng(),
        )?;

        let mut power_gained = 0;
        let mut by_item: BTreeMap<String, (Item, i64)> = BTreeMap::new();
        for item in drawn {
            power_gained += item.score_value;
            *new_state.inventory.entry(item.id.clone()).or_insert(0) += 1;
            *new_state
                .collection_history
                .entry(item.id.clone())
                .or_insert(0) += 1;
            by_item
                .entry(item.id.clone())
                .and_modify(|(_, count)| *count += 1)
                .or_insert((item, 1));
        }
        new_state.current_items_owned += accrual.granted;
        new_state.total_power += power_gained;
        new_state.monthly_power_gain += power_gained;

        profiles::store(self.pool.inner(), &new_state, version).await?;

        economy_metrics::counters::hunts_collected(1);
        economy_metrics::counters::items_granted(accrual.granted as u64);
        record_daily_metrics(
            &self.pool,
            MetricsDelta {
                items_collected: accrual.granted,
                ..Default::default()
            },
        );
        info!(
            user = %user_id,
            items_granted = accrual.granted,
            power_gained,
            "Hunt collected"
        );

        let items_received = by_item
            .into_values()
            .map(|(item, quantity)| GrantedItem {
                item_id: item.id,
                name: item.name,
                rarity: item.rarity,
                score_value: item.score_value,
                quantity,
            })
            .collect();

        Ok(CollectOutcome {
            items_granted: accrual.granted,
            total_power_gained: power_gained,
            items_received,
        })
    }
}
