use crate::models::DbProfile;
use crate::Result;
use sqlx::PgPool;

pub struct ProfileRepository;

impl ProfileRepository {
    /// Create a profile if it does not exist yet (idempotent).
    pub async fn insert_if_absent(pool: &PgPool, profile: &DbProfile) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, token_balance, reserved_token_balance, inventory,
                collection_history, current_items_owned, total_power,
                monthly_power_gain, bot_accumulated_progress, bot_running_until,
                bot_session_runtime_minutes, last_free_run_at,
                bot_items_per_hour_level, bot_runtime_level, satellite_level,
                cost_per_hour_level, subscription_expiry, owned_ticket_ids,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(profile.user_id)
        .bind(profile.token_balance)
        .bind(profile.reserved_token_balance)
        .bind(&profile.inventory)
        .bind(&profile.collection_history)
        .bind(profile.current_items_owned)
        .bind(profile.total_power)
        .bind(profile.monthly_power_gain)
        .bind(profile.bot_accumulated_progress)
        .bind(profile.bot_running_until)
        .bind(profile.bot_session_runtime_minutes)
        .bind(profile.last_free_run_at)
        .bind(profile.bot_items_per_hour_level)
        .bind(profile.bot_runtime_level)
        .bind(profile.satellite_level)
        .bind(profile.cost_per_hour_level)
        .bind(profile.subscription_expiry)
        .bind(&profile.owned_ticket_ids)
        .bind(profile.version)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get profile row by user id
    pub async fn get(pool: &PgPool, user_id: uuid::Uuid) -> Result<Option<DbProfile>> {
        let result = sqlx::query_as::<_, DbProfile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(result)
    }

    /// Conditional full-row write: applies only if `version` still equals the
    /// value read by the caller, and bumps it. Returns false when another
    /// writer raced; the caller surfaces that as a retryable conflict, never
    /// an overwrite.
    pub async fn update_guarded(
        pool: &PgPool,
        profile: &DbProfile,
        expected_version: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                token_balance = $2,
                reserved_token_balance = $3,
                inventory = $4,
                collection_history = $5,
                current_items_owned = $6,
                total_power = $7,
                monthly_power_gain = $8,
                bot_accumulated_progress = $9,
                bot_running_until = $10,
                bot_session_runtime_minutes = $11,
                last_free_run_at = $12,
                bot_items_per_hour_level = $13,
                bot_runtime_level = $14,
                satellite_level = $15,
                cost_per_hour_level = $16,
                subscription_expiry = $17,
                owned_ticket_ids = $18,
                version = version + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND version = $19
            "#,
        )
        .bind(profile.user_id)
        .bind(profile.token_balance)
        .bind(profile.reserved_token_balance)
        .bind(&profile.inventory)
        .bind(&profile.collection_history)
        .bind(profile.current_items_owned)
        .bind(profile.total_power)
        .bind(profile.monthly_power_gain)
        .bind(profile.bot_accumulated_progress)
        .bind(profile.bot_running_until)
        .bind(profile.bot_session_runtime_minutes)
        .bind(profile.last_free_run_at)
        .bind(profile.bot_items_per_hour_level)
        .bind(profile.bot_runtime_level)
        .bind(profile.satellite_level)
        .bind(profile.cost_per_hour_level)
        .bind(profile.subscription_expiry)
        .bind(&profile.owned_ticket_ids)
        .bind(expected_version)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count total profiles
    pub async fn count(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
