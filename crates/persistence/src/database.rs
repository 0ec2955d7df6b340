//! Postgres connection and pool management

use std::time::Duration;

use bruteguard_core::StorageError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

const MAX_CONNECTIONS: u32 = 16;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pooled connection to the subnet store.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a connection pool from a Postgres DSN.
    pub async fn connect(dsn: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(dsn)
            .await
            .map_err(StorageError::unavailable)?;

        info!("connected to postgres");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::unavailable)?;

        info!("database migrations applied");
        Ok(())
    }

    /// Round-trip check against the database.
    pub async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StorageError::unavailable)?;
        Ok(())
    }

    /// Drain the pool on shutdown.
    pub async fn close(&self) {
        info!("closing postgres connection pool");
        self.pool.close().await;
    }
}
