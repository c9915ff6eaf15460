use std::collections::HashMap;
use std::env;

use crate::error::{EconomyError, Result};
use crate::types::BillingProvider;

/// Runtime tuning for the economy engines, loaded from the environment.
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// Cooldown between free hunt sessions, in hours.
    pub free_hunt_cooldown_hours: i64,
    /// How long an open trade stays valid before the sweeper expires it.
    pub trade_expiry_hours: i64,
    /// Interval between stale-trade sweeps.
    pub sweep_interval_secs: u64,
    /// Webhook signatures older than this are rejected.
    pub webhook_timestamp_tolerance_secs: i64,
    /// Per-provider webhook signing secrets.
    pub webhook_secrets: HashMap<BillingProvider, String>,
}

impl EconomyConfig {
    pub fn from_env() -> Result<Self> {
        let mut webhook_secrets = HashMap::new();
        for provider in BillingProvider::ALL {
            let var = format!(
                "BILLING_WEBHOOK_SECRET_{}",
                provider.as_str().to_ascii_uppercase()
            );
            if let Ok(secret) = env::var(&var) {
                let secret = secret.trim().to_string();
                if !secret.is_empty() {
                    webhook_secrets.insert(provider, secret);
                }
            }
        }
        if webhook_secrets.is_empty() {
            return Err(EconomyError::MissingEnvVar(
                "BILLING_WEBHOOK_SECRET_* (at least one provider)".to_string(),
            ));
        }

        Ok(Self {
            free_hunt_cooldown_hours: env_parse("FREE_HUNT_COOLDOWN_HOURS", 5),
            trade_expiry_hours: env_parse("TRADE_EXPIRY_HOURS", 24),
            sweep_interval_secs: env_parse("TRADE_SWEEP_INTERVAL_SECS", 60),
            webhook_timestamp_tolerance_secs: env_parse("WEBHOOK_TIMESTAMP_TOLERANCE_SECS", 300),
            webhook_secrets,
        })
    }

    pub fn webhook_secret(&self, provider: BillingProvider) -> Option<&str> {
        self.webhook_secrets.get(&provider).map(|s| s.as_str())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
