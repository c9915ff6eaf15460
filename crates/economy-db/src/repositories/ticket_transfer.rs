use crate::models::DbTicketTransfer;
use crate::Result;
use sqlx::PgPool;

pub struct TicketTransferRepository;

impl TicketTransferRepository {
    /// Append a transfer audit row.
    pub async fn insert(pool: &PgPool, transfer: &DbTicketTransfer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ticket_transfers (
                id, ticket_id, from_user_id, to_user_id, trade_id,
                price_tokens, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(transfer.id)
        .bind(transfer.ticket_id)
        .bind(transfer.from_user_id)
        .bind(transfer.to_user_id)
        .bind(transfer.trade_id)
        .bind(transfer.price_tokens)
        .bind(transfer.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
