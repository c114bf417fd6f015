//! Database connection pool
//!
//! A thin abstraction over the SQLite pool. The store handle is always built
//! explicitly from configuration and passed to whoever needs it; there is no
//! process-wide connection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DatabaseConfig, DatabaseLocation};

/// Database pool trait.
///
/// Everything above the pool talks to storage through this trait, so tests
/// can hand out isolated in-memory instances.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL statement that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool
    async fn close(&self);

    /// Where this pool's database lives
    fn location(&self) -> &DatabaseLocation;

    /// Get the underlying SQLite pool
    fn sqlite(&self) -> &SqlitePool;
}

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
    location: DatabaseLocation,
}

impl SqliteDatabase {
    /// Open (and create if missing) the database at `location`.
    pub async fn new(location: DatabaseLocation) -> Result<Self> {
        let pool = match &location {
            DatabaseLocation::Memory => {
                // Every SQLite in-memory connection is a separate database, so
                // the pool must never open a second one or drop the first.
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .context("Invalid in-memory SQLite options")?
                    .foreign_keys(true);
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>)
                    .connect_with(options)
                    .await
                    .context("Failed to open in-memory SQLite database")?
            }
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).with_context(|| {
                            format!("Failed to create database directory: {:?}", parent)
                        })?;
                    }
                }

                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .foreign_keys(true);
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
                    .with_context(|| {
                        format!("Failed to connect to SQLite database: {}", path.display())
                    })?
            }
        };

        Ok(Self { pool, location })
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    fn sqlite(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Type alias for a shared database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let location = config.location();
    tracing::debug!("Opening database at {:?}", location);
    let db = SqliteDatabase::new(location).await?;
    Ok(Arc::new(db))
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig::in_memory()).await
}
