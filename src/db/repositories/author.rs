//! Author repository
//!
//! Database operations for authors. The author's article collection is
//! served by [`ArticleRepository::list_by_author`](super::ArticleRepository::list_by_author).

use crate::db::DynDatabasePool;
use crate::models::Author;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection};
use std::sync::Arc;

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Get author by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;

    /// Get author by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Author>>;

    /// List all authors ordered by ID
    async fn list(&self) -> Result<Vec<Author>>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthorRepository {
    /// Create a new SQLx author repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT id, name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by ID")?;

        Ok(row.map(|row| row_to_author_sqlite(&row)))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT id, name FROM authors WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by name")?;

        Ok(row.map(|row| row_to_author_sqlite(&row)))
    }

    async fn list(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query("SELECT id, name FROM authors ORDER BY id")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list authors")?;

        Ok(rows.iter().map(row_to_author_sqlite).collect())
    }
}

/// Insert an author row and return its generated ID
pub(crate) async fn insert_author(conn: &mut SqliteConnection, name: &str) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO authors (name) VALUES (?)")
        .bind(name)
        .execute(conn)
        .await?;
    Ok(result.last_insert_rowid())
}

fn row_to_author_sqlite(row: &sqlx::sqlite::SqliteRow) -> Author {
    Author {
        id: row.get("id"),
        name: row.get("name"),
    }
}
