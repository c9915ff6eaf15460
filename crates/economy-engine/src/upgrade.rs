//! Upgrade Engine: four independent exponential-cost tracks, each purchase
//! an atomic debit+increment guarded against concurrent balance writers.

use std::sync::Arc;

use economy_core::types::UpgradeTrack;
use economy_core::{math, EconomyError, Result};
use economy_db::models::MetricsDelta;
use economy_db::DatabasePool;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::ledger::record_daily_metrics;
use crate::profiles;

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeOutcome {
    pub track: UpgradeTrack,
    pub new_level: i32,
    pub tokens_spent: i64,
    pub levels_upgraded: i32,
    pub levels_requested: i32,
}

pub struct UpgradeEngine {
    pool: Arc<DatabasePool>,
}

impl UpgradeEngine {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Buy up to `levels` levels on `track`. Applies the single-level
    /// operation repeatedly and stops early when funds run out: partial
    /// progress is a success the caller inspects via `levels_upgraded`,
    /// not an error. Hitting the cap or having no funds on the *first*
    /// level is an error.
    pub async fn upgrade(
        &self,
        user_id: Uuid,
        track: UpgradeTrack,
        levels: i32,
    ) -> Result<UpgradeOutcome> {
        if levels <= 0 {
            return Err(EconomyError::Validation(format!(
                "levels must be positive, got {levels}"
            )));
        }

        let curve = track.curve();
        let mut spent_total = 0;
        let mut done = 0;
        let mut new_level = 0;

        for step in 0..levels {
            let mut step_cost = 0;
            let result = profiles::update_guarded(self.pool.inner(), user_id, 1, |state| {
                let level = state.upgrade_level(track);
                if level >= curve.max_level {
                    return Err(EconomyError::MaxLevelReached(track.as_str()));
                }
                let cost = math::upgrade_cost(level, curve);
                let available = state.available_balance();
                if cost > available {
                    return Err(EconomyError::InsufficientFunds {
                        needed: cost,
                        available,
                    });
                }
                state.token_balance -= cost;
                state.set_upgrade_level(track, level + 1);
                step_cost = cost;
                Ok(())
            })
            .await;

            match result {
                Ok(state) => {
                    spent_total += step_cost;
                    done += 1;
                    new_level = state.upgrade_level(track);
                }
                Err(
                    EconomyError::InsufficientFunds { .. } | EconomyError::MaxLevelReached(_),
                ) if step > 0 => break,
                Err(err) => return Err(err),
            }
        }

        economy_metrics::counters::upgrades(track.as_str(), done as u64);
        economy_metrics::counters::tokens_burned(spent_total as u64);
        record_daily_metrics(&self.pool, MetricsDelta::tokens_burned(spent_total));
        info!(
            user = %user_id,
            track = track.as_str(),
            new_level,
            tokens_spent = spent_total,
            levels_upgraded = done,
            "Upgrade purchased"
        );

        Ok(UpgradeOutcome {
            track,
            new_level,
            tokens_spent: spent_total,
            levels_upgraded: done,
            levels_requested: levels,
        })
    }
}
