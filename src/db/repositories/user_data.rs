//! UserData repository
//!
//! Database operations for the extended user profile, including the
//! `user.userdata` navigation of the one-to-one relationship.

use crate::db::DynDatabasePool;
use crate::models::UserData;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

/// UserData repository trait
#[async_trait]
pub trait UserDataRepository: Send + Sync {
    /// Get user data by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<UserData>>;

    /// Get the user data linked to a user (`user.userdata`)
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserData>>;

    /// List all user data ordered by ID
    async fn list(&self) -> Result<Vec<UserData>>;
}

/// SQLx-based user data repository implementation
pub struct SqlxUserDataRepository {
    pool: DynDatabasePool,
}

impl SqlxUserDataRepository {
    /// Create a new SQLx user data repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserDataRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserDataRepository for SqlxUserDataRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<UserData>> {
        let row = sqlx::query("SELECT id, email, user_id FROM user_data WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get user data by ID")?;

        Ok(row.map(|row| row_to_user_data_sqlite(&row)))
    }

    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserData>> {
        get_user_data_by_user_sqlite(self.pool.sqlite(), user_id).await
    }

    async fn list(&self) -> Result<Vec<UserData>> {
        let rows = sqlx::query("SELECT id, email, user_id FROM user_data ORDER BY id")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list user data")?;

        Ok(rows.iter().map(row_to_user_data_sqlite).collect())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

/// Insert a user data row and return its generated ID
pub(crate) async fn insert_user_data(
    conn: &mut SqliteConnection,
    email: &str,
    user_id: Option<i64>,
) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO user_data (email, user_id) VALUES (?, ?)")
        .bind(email)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Point an existing user data row at a user (or at nobody)
pub(crate) async fn set_user_data_owner(
    conn: &mut SqliteConnection,
    id: i64,
    user_id: Option<i64>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE user_data SET user_id = ? WHERE id = ?")
        .bind(user_id)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Detach whatever user data currently references `user_id`, except `keep`.
///
/// Run before linking `keep` to the user so the user never ends up with two.
pub(crate) async fn release_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    keep: Option<i64>,
) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE user_data SET user_id = NULL WHERE user_id = ? AND id IS NOT ?")
        .bind(user_id)
        .bind(keep)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

async fn get_user_data_by_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<UserData>> {
    let row = sqlx::query("SELECT id, email, user_id FROM user_data WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user data by user ID")?;

    Ok(row.map(|row| row_to_user_data_sqlite(&row)))
}

fn row_to_user_data_sqlite(row: &sqlx::sqlite::SqliteRow) -> UserData {
    UserData {
        id: row.get("id"),
        email: row.get("email"),
        user_id: row.get("user_id"),
    }
}
