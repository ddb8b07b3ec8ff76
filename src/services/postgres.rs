use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::services::session::Sessions;

/// Explicitly owned PostgreSQL connection pool.
///
/// Constructed once at startup and handed to whoever needs data access; no
/// process-wide singleton. The pool is the only shared mutable resource at
/// this layer, and session scopes check connections out of it one at a time.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect with explicit pool bounds.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Connect using the pool bounds and timeouts from configuration.
    ///
    /// Schema creation and migration are not this crate's job; the expected
    /// DDL is documented in `models`.
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, sqlx::Error> {
        tracing::info!(
            host = %settings.host,
            database = %settings.name,
            "connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.unwrap_or(10))
            .min_connections(settings.min_connections.unwrap_or(1))
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)))
            .test_before_acquire(true)
            .connect(&settings.connection_url())
            .await?;

        Ok(Self { pool })
    }

    /// Session-scope factory bound to this pool.
    pub fn sessions(&self) -> Sessions {
        Sessions::new(self.pool.clone())
    }

    /// Health check for the database connection.
    pub async fn health_check(&self) -> Result<bool, sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    /// Part of the owner's shutdown responsibility.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
