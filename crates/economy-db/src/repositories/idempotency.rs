use crate::models::DbIdempotencyRecord;
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

pub struct IdempotencyRepository;

impl IdempotencyRepository {
    /// Persist a completed operation's response under its key. Returns false
    /// if the key already exists (a racing retry finished first).
    pub async fn insert(
        pool: &PgPool,
        key: &str,
        operation: &str,
        response: &Value,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_records (key, operation, response, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(operation)
        .bind(response)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<DbIdempotencyRecord>> {
        let result = sqlx::query_as::<_, DbIdempotencyRecord>(
            "SELECT * FROM idempotency_records WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;
        Ok(result)
    }
}
