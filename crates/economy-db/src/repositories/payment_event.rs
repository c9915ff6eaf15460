use crate::models::DbPaymentEvent;
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

pub struct PaymentEventRepository;

impl PaymentEventRepository {
    /// Claim a webhook event for processing. Idempotent: a conflict on
    /// (provider, provider_event_id) means the event was already accepted,
    /// and the processor must do no further work.
    pub async fn insert_processing(
        pool: &PgPool,
        provider: &str,
        provider_event_id: &str,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO billing_payment_events (
                provider, provider_event_id, processing_status, minted_quantity,
                failure_reason, payload, created_at, updated_at
            )
            VALUES ($1, $2, 'processing', 0, NULL, $3, $4, $4)
            ON CONFLICT (provider, provider_event_id) DO NOTHING
            "#,
        )
        .bind(provider)
        .bind(provider_event_id)
        .bind(payload)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_processed(
        pool: &PgPool,
        provider: &str,
        provider_event_id: &str,
        minted_quantity: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE billing_payment_events
            SET processing_status = 'processed', minted_quantity = $3, updated_at = NOW()
            WHERE provider = $1 AND provider_event_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_event_id)
        .bind(minted_quantity)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(
        pool: &PgPool,
        provider: &str,
        provider_event_id: &str,
        minted_quantity: i32,
        reason: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE billing_payment_events
            SET processing_status = 'failed', minted_quantity = $3,
                failure_reason = $4, updated_at = NOW()
            WHERE provider = $1 AND provider_event_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_event_id)
        .bind(minted_quantity)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(
        pool: &PgPool,
        provider: &str,
        provider_event_id: &str,
    ) -> Result<Option<DbPaymentEvent>> {
        let result = sqlx::query_as::<_, DbPaymentEvent>(
            "SELECT * FROM billing_payment_events WHERE provider = $1 AND provider_event_id = $2",
        )
        .bind(provider)
        .bind(provider_event_id)
        .fetch_optional(pool)
        .await?;
        Ok(result)
    }
}
