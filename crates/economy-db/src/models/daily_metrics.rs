use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the daily_economy_metrics table, one row per UTC day.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbDailyMetrics {
    /// UTC date (primary key)
    pub date: NaiveDate,
    pub tokens_generated: i64,
    pub tokens_burned: i64,
    pub items_collected: i64,
    pub items_sold: i64,
    pub trades_settled: i64,
    pub tickets_minted: i64,
    pub tickets_redeemed: i64,
}

/// Increments applied to today's metrics row in a single upsert.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsDelta {
    pub tokens_generated: i64,
    pub tokens_burned: i64,
    pub items_collected: i64,
    pub items_sold: i64,
    pub trades_settled: i64,
    pub tickets_minted: i64,
    pub tickets_redeemed: i64,
}

impl MetricsDelta {
    pub fn tokens_generated(amount: i64) -> Self {
        Self {
            tokens_generated: amount,
            ..Default::default()
        }
    }

    pub fn tokens_burned(amount: i64) -> Self {
        Self {
            tokens_burned: amount,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens_generated == 0
            && self.tokens_burned == 0
            && self.items_collected == 0
            && self.items_sold == 0
            && self.trades_settled == 0
            && self.tickets_minted == 0
            && self.tickets_redeemed == 0
    }
}
