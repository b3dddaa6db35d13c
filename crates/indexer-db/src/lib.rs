pub mod config;
pub mod models;
pub mod pool;
pub mod repositories;
mod store;

pub use config::DatabaseConfig;
pub use pool::DatabasePool;
pub use store::PgStore;

use indexer_core::IndexerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
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

impl From<DatabaseError> for IndexerError {
    fn from(err: DatabaseError) -> Self {
        IndexerError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
