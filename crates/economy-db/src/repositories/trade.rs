use crate::models::DbTrade;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TradeRepository;

impl TradeRepository {
    pub async fn insert(pool: &PgPool, trade: &DbTrade) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                id, seller_id, buyer_id, ticket_ids, price_tokens, state,
                seller_confirmed_at, buyer_confirmed_at, settled_at,
                cancelled_at, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(trade.id)
        .bind(trade.seller_id)
        .bind(trade.buyer_id)
        .bind(&trade.ticket_ids)
        .bind(trade.price_tokens)
        .bind(&trade.state)
        .bind(trade.seller_confirmed_at)
        .bind(trade.buyer_confirmed_at)
        .bind(trade.settled_at)
        .bind(trade.cancelled_at)
        .bind(trade.expires_at)
        .bind(trade.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Get trade by id
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<DbTrade>> {
        let result = sqlx::query_as::<_, DbTrade>("SELECT * FROM trades WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(result)
    }

    /// Record one side's confirmation, gated on the exact current state.
    pub async fn confirm(
        pool: &PgPool,
        id: Uuid,
        expected_state: &str,
        new_state: &str,
        seller: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let query = if seller {
            r#"
            UPDATE trades SET state = $3, seller_confirmed_at = $4
            WHERE id = $1 AND state = $2
            "#
        } else {
            r#"
            UPDATE trades SET state = $3, buyer_confirmed_at = $4
            WHERE id = $1 AND state = $2
            "#
        };
        let result = sqlx::query(query)
            .bind(id)
            .bind(expected_state)
            .bind(new_state)
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// ready_to_settle -> settled. The first irreversible write of the
    /// settlement protocol; gated on the state being exactly ready_to_settle
    /// so concurrent settlement attempts resolve to a single winner.
    pub async fn mark_settled(pool: &PgPool, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades SET state = 'settled', settled_at = $2
            WHERE id = $1 AND state = 'ready_to_settle'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Cancel from a pre-ready_to_settle open state.
    pub async fn mark_cancelled(pool: &PgPool, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades SET state = 'cancelled', cancelled_at = $2
            WHERE id = $1 AND state IN ('draft', 'seller_confirmed', 'buyer_confirmed')
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Expire a single stale open trade.
    pub async fn mark_expired(pool: &PgPool, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades SET state = 'expired', cancelled_at = $2
            WHERE id = $1
              AND state IN ('draft', 'seller_confirmed', 'buyer_confirmed', 'ready_to_settle')
              AND expires_at <= $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Open trades whose expiry has passed, oldest first.
    pub async fn find_expired(pool: &PgPool, now: DateTime<Utc>, limit: i64) -> Result<Vec<DbTrade>> {
        let results = sqlx::query_as::<_, DbTrade>(
            r#"
            SELECT * FROM trades
            WHERE state IN ('draft', 'seller_confirmed', 'buyer_confirmed', 'ready_to_settle')
              AND expires_at <= $1
            ORDER BY expires_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }

    /// Count trades currently holding ticket locks (open states).
    pub async fn count_open(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM trades
            WHERE state IN ('draft', 'seller_confirmed', 'buyer_confirmed', 'ready_to_settle')
            "#,
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
