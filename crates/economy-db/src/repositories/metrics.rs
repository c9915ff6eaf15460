use crate::models::{DbDailyMetrics, MetricsDelta};
use crate::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct DailyMetricsRepository;

impl DailyMetricsRepository {
    /// Apply a delta to the given day's row, creating it on first touch.
    /// One statement so concurrent increments never lose updates.
    pub async fn increment(pool: &PgPool, date: NaiveDate, delta: &MetricsDelta) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_economy_metrics (
                date, tokens_generated, tokens_burned, items_collected,
                items_sold, trades_settled, tickets_minted, tickets_redeemed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (date) DO UPDATE SET
                tokens_generated = daily_economy_metrics.tokens_generated + EXCLUDED.tokens_generated,
                tokens_burned = daily_economy_metrics.tokens_burned + EXCLUDED.tokens_burned,
                items_collected = daily_economy_metrics.items_collected + EXCLUDED.items_collected,
                items_sold = daily_economy_metrics.items_sold + EXCLUDED.items_sold,
                trades_settled = daily_economy_metrics.trades_settled + EXCLUDED.trades_settled,
                tickets_minted = daily_economy_metrics.tickets_minted + EXCLUDED.tickets_minted,
                tickets_redeemed = daily_economy_metrics.tickets_redeemed + EXCLUDED.tickets_redeemed
            "#,
        )
        .bind(date)
        .bind(delta.tokens_generated)
        .bind(delta.tokens_burned)
        .bind(delta.items_collected)
        .bind(delta.items_sold)
        .bind(delta.trades_settled)
        .bind(delta.tickets_minted)
        .bind(delta.tickets_redeemed)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(pool: &PgPool, date: NaiveDate) -> Result<Option<DbDailyMetrics>> {
        let result = sqlx::query_as::<_, DbDailyMetrics>(
            "SELECT * FROM daily_economy_metrics WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(pool)
        .await?;
        Ok(result)
    }
}
