use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::math::{self, UpgradeCurve};

/// Per-user economy state, one row per user. All balance-like fields are
/// exact integers; fractional hunt progress lives in `bot_accumulated_progress`
/// and stays in [0, 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEconomyState {
    pub user_id: Uuid,
    pub token_balance: i64,
    pub reserved_token_balance: i64,
    /// item id -> quantity currently held; absent key means zero.
    pub inventory: BTreeMap<String, i64>,
    /// item id -> cumulative quantity ever obtained; monotonically non-decreasing.
    pub collection_history: BTreeMap<String, i64>,
    pub current_items_owned: i64,
    pub total_power: i64,
    pub monthly_power_gain: i64,
    pub bot_accumulated_progress: f64,
    pub bot_running_until: Option<DateTime<Utc>>,
    pub bot_session_runtime_minutes: Option<i32>,
    pub last_free_run_at: Option<DateTime<Utc>>,
    pub bot_items_per_hour_level: i32,
    pub bot_runtime_level: i32,
    pub satellite_level: i32,
    pub cost_per_hour_level: i32,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub owned_ticket_ids: BTreeSet<Uuid>,
}

impl UserEconomyState {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            token_balance: 0,
            reserved_token_balance: 0,
            inventory: BTreeMap::new(),
            collection_history: BTreeMap::new(),
            current_items_owned: 0,
            total_power: 0,
            monthly_power_gain: 0,
            bot_accumulated_progress: 0.0,
            bot_running_until: None,
            bot_session_runtime_minutes: None,
            last_free_run_at: None,
            bot_items_per_hour_level: 0,
            bot_runtime_level: 0,
            satellite_level: 0,
            cost_per_hour_level: 0,
            subscription_expiry: None,
            owned_ticket_ids: BTreeSet::new(),
        }
    }

    /// Tokens not reserved for a pending trade.
    pub fn available_balance(&self) -> i64 {
        self.token_balance - self.reserved_token_balance
    }

    /// Derive the hunt session phase from the session fields. This is the
    /// single place the implicit timestamp state machine is made explicit;
    /// every transition gate goes through it.
    pub fn hunt_phase(&self, now: DateTime<Utc>) -> HuntPhase {
        match self.bot_running_until {
            None => HuntPhase::Idle,
            Some(until) if until > now => HuntPhase::Running { until },
            Some(until) => HuntPhase::Collectible { finished_at: until },
        }
    }

    pub fn upgrade_level(&self, track: UpgradeTrack) -> i32 {
        match track {
            UpgradeTrack::BotSpeed => self.bot_items_per_hour_level,
            UpgradeTrack::Runtime => self.bot_runtime_level,
            UpgradeTrack::Satellite => self.satellite_level,
            UpgradeTrack::CostPerHour => self.cost_per_hour_level,
        }
    }

    pub fn set_upgrade_level(&mut self, track: UpgradeTrack, level: i32) {
        match track {
            UpgradeTrack::BotSpeed => self.bot_items_per_hour_level = level,
            UpgradeTrack::Runtime => self.bot_runtime_level = level,
            UpgradeTrack::Satellite => self.satellite_level = level,
            UpgradeTrack::CostPerHour => self.cost_per_hour_level = level,
        }
    }
}

/// Hunt session phase derived from `bot_running_until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntPhase {
    Idle,
    Running { until: DateTime<Utc> },
    Collectible { finished_at: DateTime<Utc> },
}

/// The four independent upgrade tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTrack {
    BotSpeed,
    Runtime,
    Satellite,
    CostPerHour,
}

impl UpgradeTrack {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeTrack::BotSpeed => "bot_speed",
            UpgradeTrack::Runtime => "runtime",
            UpgradeTrack::Satellite => "satellite",
            UpgradeTrack::CostPerHour => "cost_per_hour",
        }
    }

    pub fn curve(&self) -> &'static UpgradeCurve {
        match self {
            UpgradeTrack::BotSpeed => &math::BOT_SPEED_CURVE,
            UpgradeTrack::Runtime => &math::RUNTIME_CURVE,
            UpgradeTrack::Satellite => &math::SATELLITE_CURVE,
            UpgradeTrack::CostPerHour => &math::COST_PER_HOUR_CURVE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn hunt_phase_derivation() {
        let now = Utc::now();
        let mut state = UserEconomyState::new(Uuid::new_v4());
        assert_eq!(state.hunt_phase(now), HuntPhase::Idle);

        let until = now + Duration::minutes(10);
        state.bot_running_until = Some(until);
        assert_eq!(state.hunt_phase(now), HuntPhase::Running { until });

        let finished = now - Duration::minutes(1);
        state.bot_running_until = Some(finished);
        assert_eq!(
            state.hunt_phase(now),
            HuntPhase::Collectible {
                finished_at: finished
            }
        );
    }

    #[test]
    fn available_balance_subtracts_reservation() {
        let mut state = UserEconomyState::new(Uuid::new_v4());
        state.token_balance = 100;
        state.reserved_token_balance = 40;
        assert_eq!(state.available_balance(), 60);
    }
}
