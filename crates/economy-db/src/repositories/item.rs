use crate::models::DbItem;
use crate::Result;
use sqlx::PgPool;

pub struct ItemRepository;

impl ItemRepository {
    /// Load the full catalog (it is small and immutable at runtime).
    pub async fn get_all(pool: &PgPool) -> Result<Vec<DbItem>> {
        let results = sqlx::query_as::<_, DbItem>("SELECT * FROM items ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(results)
    }

    pub async fn get(pool: &PgPool, id: &str) -> Result<Option<DbItem>> {
        let result = sqlx::query_as::<_, DbItem>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(result)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
