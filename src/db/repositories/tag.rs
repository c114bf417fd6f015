//! Tag repository
//!
//! Database operations for tags, plus the `article.tags` side of the
//! article ↔ tag relationship. Associations live in the `article_tags`
//! junction table and are always read back from it.

use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by ID
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Get tags for an article (`article.tags`)
    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        get_tag_by_id_sqlite(self.pool.sqlite(), id).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        get_tag_by_name_sqlite(self.pool.sqlite(), name).await
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        list_tags_sqlite(self.pool.sqlite()).await
    }

    async fn get_by_article_id(&self, article_id: i64) -> Result<Vec<Tag>> {
        get_tags_by_article_sqlite(self.pool.sqlite(), article_id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

/// Insert a tag row and return its generated ID
pub(crate) async fn insert_tag(conn: &mut SqliteConnection, name: &str) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
        .bind(name)
        .execute(conn)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Associate a tag with an article. Linking an existing pair is a no-op.
pub(crate) async fn link_article_tag(
    conn: &mut SqliteConnection,
    article_id: i64,
    tag_id: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO article_tags (article_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by ID")?;

    Ok(row.map(|row| row_to_tag_sqlite(&row)))
}

async fn get_tag_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get tag by name")?;

    Ok(row.map(|row| row_to_tag_sqlite(&row)))
}

async fn list_tags_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list tags")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn get_tags_by_article_sqlite(pool: &SqlitePool, article_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name
        FROM tags t
        INNER JOIN article_tags at ON t.id = at.tag_id
        WHERE at.article_id = ?
        ORDER BY t.id
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await
    .context("Failed to get tags by article")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
    }
}
