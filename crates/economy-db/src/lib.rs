pub mod config;
pub mod models;
pub mod pool;
pub mod repositories;

pub use config::DatabaseConfig;
pub use pool::DatabasePool;

use economy_core::EconomyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Corrupt persisted state for {entity}: {reason}")]
    Corrupt { entity: &'static str, reason: String },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::Query(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::Migration(err.to_string())
    }
}

impl From<DatabaseError> for EconomyError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Corrupt { entity, reason } => EconomyError::Corrupt { entity, reason },
            other => EconomyError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
