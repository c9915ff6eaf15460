use crate::models::DbTicket;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TicketRepository;

impl TicketRepository {
    /// Insert a freshly minted ticket. Idempotent on `payment_ref`: a
    /// duplicate means the payment was already minted, and the caller
    /// fetches the existing row instead of erroring.
    pub async fn insert_minted(pool: &PgPool, ticket: &DbTicket) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO marketplace_tickets (
                ticket_id, owner_user_id, source, status, redeem_value_months,
                listed_price_tokens, active_trade_id, payment_ref,
                created_at, transferred_at, redeemed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (payment_ref) DO NOTHING
            "#,
        )
        .bind(ticket.ticket_id)
        .bind(ticket.owner_user_id)
        .bind(&ticket.source)
        .bind(&ticket.status)
        .bind(ticket.redeem_value_months)
        .bind(ticket.listed_price_tokens)
        .bind(ticket.active_trade_id)
        .bind(&ticket.payment_ref)
        .bind(ticket.created_at)
        .bind(ticket.transferred_at)
        .bind(ticket.redeemed_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get ticket by id
    pub async fn get(pool: &PgPool, ticket_id: Uuid) -> Result<Option<DbTicket>> {
        let result =
            sqlx::query_as::<_, DbTicket>("SELECT * FROM marketplace_tickets WHERE ticket_id = $1")
                .bind(ticket_id)
                .fetch_optional(pool)
                .await?;
        Ok(result)
    }

    pub async fn get_by_payment_ref(pool: &PgPool, payment_ref: &str) -> Result<Option<DbTicket>> {
        let result = sqlx::query_as::<_, DbTicket>(
            "SELECT * FROM marketplace_tickets WHERE payment_ref = $1",
        )
        .bind(payment_ref)
        .fetch_optional(pool)
        .await?;
        Ok(result)
    }

    /// Fetch several tickets at once (for trade validation)
    pub async fn get_many(pool: &PgPool, ticket_ids: &[Uuid]) -> Result<Vec<DbTicket>> {
        let results = sqlx::query_as::<_, DbTicket>(
            "SELECT * FROM marketplace_tickets WHERE ticket_id = ANY($1)",
        )
        .bind(ticket_ids)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }

    /// OWNED -> LISTED, gated on current owner and status.
    pub async fn list_for_trade(
        pool: &PgPool,
        ticket_id: Uuid,
        owner: Uuid,
        stored_price: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_tickets
            SET status = 'LISTED', listed_price_tokens = $3
            WHERE ticket_id = $1 AND owner_user_id = $2 AND status = 'OWNED'
            "#,
        )
        .bind(ticket_id)
        .bind(owner)
        .bind(stored_price)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// OWNED/LISTED -> LOCKED_IN_TRADE. The lock is exclusive: the predicate
    /// requires no other trade currently holds the ticket.
    pub async fn lock_to_trade(
        pool: &PgPool,
        ticket_id: Uuid,
        owner: Uuid,
        trade_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_tickets
            SET status = 'LOCKED_IN_TRADE', active_trade_id = $3
            WHERE ticket_id = $1 AND owner_user_id = $2
              AND status IN ('OWNED', 'LISTED') AND active_trade_id IS NULL
            "#,
        )
        .bind(ticket_id)
        .bind(owner)
        .bind(trade_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// LOCKED_IN_TRADE -> OWNED, only for the lock-holding trade.
    pub async fn unlock_from_trade(pool: &PgPool, ticket_id: Uuid, trade_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_tickets
            SET status = 'OWNED', active_trade_id = NULL, listed_price_tokens = NULL
            WHERE ticket_id = $1 AND active_trade_id = $2 AND status = 'LOCKED_IN_TRADE'
            "#,
        )
        .bind(ticket_id)
        .bind(trade_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a LISTED ticket to a new owner (direct buy-now purchase).
    pub async fn transfer_listed(
        pool: &PgPool,
        ticket_id: Uuid,
        from: Uuid,
        to: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_tickets
            SET owner_user_id = $3, status = 'OWNED', active_trade_id = NULL,
                listed_price_tokens = NULL, transferred_at = $4
            WHERE ticket_id = $1 AND owner_user_id = $2
              AND status = 'LISTED' AND active_trade_id IS NULL
            "#,
        )
        .bind(ticket_id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a ticket locked to `trade_id` to the buyer (trade settlement).
    pub async fn transfer_locked(
        pool: &PgPool,
        ticket_id: Uuid,
        trade_id: Uuid,
        to: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_tickets
            SET owner_user_id = $3, status = 'OWNED', active_trade_id = NULL,
                listed_price_tokens = NULL, transferred_at = $4
            WHERE ticket_id = $1 AND active_trade_id = $2 AND status = 'LOCKED_IN_TRADE'
            "#,
        )
        .bind(ticket_id)
        .bind(trade_id)
        .bind(to)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Single-shot redemption: the `redeemed_at IS NULL` predicate makes a
    /// second redeem a no-op at the store level.
    pub async fn redeem(
        pool: &PgPool,
        ticket_id: Uuid,
        owner: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE marketplace_tickets
            SET status = 'REDEEMED', redeemed_at = $3
            WHERE ticket_id = $1 AND owner_user_id = $2
              AND status IN ('OWNED', 'CANCELLED') AND redeemed_at IS NULL
            "#,
        )
        .bind(ticket_id)
        .bind(owner)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
