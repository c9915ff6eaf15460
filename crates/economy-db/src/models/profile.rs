use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use economy_core::types::UserEconomyState;

use crate::{DatabaseError, Result};

/// Database model for the profiles table. Inventory, collection history and
/// owned tickets are stored as jsonb and validated into typed collections at
/// this boundary; malformed persisted data is rejected loudly, never
/// defaulted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProfile {
    /// User id (primary key)
    pub user_id: Uuid,
    pub token_balance: i64,
    pub reserved_token_balance: i64,
    /// jsonb object: item id -> positive quantity
    pub inventory: Value,
    /// jsonb object: item id -> cumulative quantity ever obtained
    pub collection_history: Value,
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
    /// jsonb array of ticket uuids
    pub owned_ticket_ids: Value,
    /// Optimistic-concurrency guard; every write checks and bumps it.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbProfile {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            token_balance: 0,
            reserved_token_balance: 0,
            inventory: Value::Object(Default::default()),
            collection_history: Value::Object(Default::default()),
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
            owned_ticket_ids: Value::Array(Vec::new()),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the row into the typed domain state.
    pub fn into_state(self) -> Result<UserEconomyState> {
        Ok(UserEconomyState {
            user_id: self.user_id,
            token_balance: self.token_balance,
            reserved_token_balance: self.reserved_token_balance,
            inventory: parse_quantity_map(&self.inventory, "profile.inventory")?,
            collection_history: parse_quantity_map(
                &self.collection_history,
                "profile.collection_history",
            )?,
            current_items_owned: self.current_items_owned,
            total_power: self.total_power,
            monthly_power_gain: self.monthly_power_gain,
            bot_accumulated_progress: self.bot_accumulated_progress,
            bot_running_until: self.bot_running_until,
            bot_session_runtime_minutes: self.bot_session_runtime_minutes,
            last_free_run_at: self.last_free_run_at,
            bot_items_per_hour_level: self.bot_items_per_hour_level,
            bot_runtime_level: self.bot_runtime_level,
            satellite_level: self.satellite_level,
            cost_per_hour_level: self.cost_per_hour_level,
            subscription_expiry: self.subscription_expiry,
            owned_ticket_ids: parse_ticket_set(&self.owned_ticket_ids)?,
        })
    }

    /// Serialize typed state back into row form for a guarded write.
    pub fn from_state(state: &UserEconomyState, version: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id: state.user_id,
            token_balance: state.token_balance,
            reserved_token_balance: state.reserved_token_balance,
            inventory: quantity_map_to_json(&state.inventory),
            collection_history: quantity_map_to_json(&state.collection_history),
            current_items_owned: state.current_items_owned,
            total_power: state.total_power,
            monthly_power_gain: state.monthly_power_gain,
            bot_accumulated_progress: state.bot_accumulated_progress,
            bot_running_until: state.bot_running_until,
            bot_session_runtime_minutes: state.bot_session_runtime_minutes,
            last_free_run_at: state.last_free_run_at,
            bot_items_per_hour_level: state.bot_items_per_hour_level,
            bot_runtime_level: state.bot_runtime_level,
            satellite_level: state.satellite_level,
            cost_per_hour_level: state.cost_per_hour_level,
            subscription_expiry: state.subscription_expiry,
            owned_ticket_ids: ticket_set_to_json(&state.owned_ticket_ids),
            version,
            created_at: now,
            updated_at: now,
        }
    }
}

fn parse_quantity_map(value: &Value, entity: &'static str) -> Result<BTreeMap<String, i64>> {
    let object = value.as_object().ok_or_else(|| DatabaseError::Corrupt {
        entity,
        reason: "expected a JSON object".to_string(),
    })?;

    let mut map = BTreeMap::new();
    for (key, qty) in object {
        let qty = qty.as_i64().ok_or_else(|| DatabaseError::Corrupt {
            entity,
            reason: format!("quantity for {key} is not an integer"),
        })?;
        if qty <= 0 {
            return Err(DatabaseError::Corrupt {
                entity,
                reason: format!("non-positive quantity {qty} for {key}"),
            });
        }
        map.insert(key.clone(), qty);
    }
    Ok(map)
}

fn quantity_map_to_json(map: &BTreeMap<String, i64>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::from(*v)))
            .collect(),
    )
}

fn parse_ticket_set(value: &Value) -> Result<BTreeSet<Uuid>> {
    let array = value.as_array().ok_or_else(|| DatabaseError::Corrupt {
        entity: "profile.owned_ticket_ids",
        reason: "expected a JSON array".to_string(),
    })?;

    let mut set = BTreeSet::new();
    for entry in array {
        let id = entry
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| DatabaseError::Corrupt {
                entity: "profile.owned_ticket_ids",
                reason: format!("not a uuid: {entry}"),
            })?;
        set.insert(id);
    }
    Ok(set)
}

fn ticket_set_to_json(set: &BTreeSet<Uuid>) -> Value {
    Value::Array(set.iter().map(|id| Value::from(id.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_state() {
        let now = Utc::now();
        let mut row = DbProfile::new(Uuid::new_v4(), now);
        row.token_balance = 500;
        row.inventory = json!({"pearl": 3, "shell": 1});
        row.owned_ticket_ids = json!(["4b4b4a46-9f2f-4a2e-8a96-0e6d72f5c111"]);

        let state = row.clone().into_state().expect("valid row");
        assert_eq!(state.inventory.get("pearl"), Some(&3));
        assert_eq!(state.owned_ticket_ids.len(), 1);

        let back = DbProfile::from_state(&state, 7, now);
        assert_eq!(back.token_balance, 500);
        assert_eq!(back.version, 7);
        assert_eq!(back.inventory, json!({"pearl": 3, "shell": 1}));
    }

    #[test]
    fn rejects_malformed_inventory() {
        let now = Utc::now();
        let mut row = DbProfile::new(Uuid::new_v4(), now);
        row.inventory = json!({"pearl": "three"});
        assert!(matches!(
            row.clone().into_state(),
            Err(DatabaseError::Corrupt { .. })
        ));

        row.inventory = json!({"pearl": 0});
        assert!(matches!(
            row.clone().into_state(),
            Err(DatabaseError::Corrupt { .. })
        ));

        row.inventory = json!([1, 2]);
        assert!(matches!(
            row.into_state(),
            Err(DatabaseError::Corrupt { .. })
        ));
    }
}
