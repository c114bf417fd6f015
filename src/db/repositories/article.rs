//! Article repository
//!
//! Database operations for articles.
//!
//! Besides plain lookups this serves two relationship navigations:
//! - `author.articles` via [`ArticleRepository::list_by_author`]
//! - `tag.articles` via [`ArticleRepository::list_by_tag`], through the
//!   `article_tags` junction table

use crate::db::DynDatabasePool;
use crate::models::Article;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Get article by title
    async fn get_by_title(&self, title: &str) -> Result<Option<Article>>;

    /// List all articles ordered by ID
    async fn list(&self) -> Result<Vec<Article>>;

    /// List the articles written by an author (`author.articles`)
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Article>>;

    /// List the articles carrying a tag (`tag.articles`)
    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Article>>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        get_article_by_id_sqlite(self.pool.sqlite(), id).await
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Article>> {
        get_article_by_title_sqlite(self.pool.sqlite(), title).await
    }

    async fn list(&self) -> Result<Vec<Article>> {
        list_articles_sqlite(self.pool.sqlite()).await
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Article>> {
        list_articles_by_author_sqlite(self.pool.sqlite(), author_id).await
    }

    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Article>> {
        list_articles_by_tag_sqlite(self.pool.sqlite(), tag_id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

/// Insert an article row and return its generated ID
pub(crate) async fn insert_article(
    conn: &mut SqliteConnection,
    title: &str,
    author_id: Option<i64>,
) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO articles (title, author_id) VALUES (?, ?)")
        .bind(title)
        .bind(author_id)
        .execute(conn)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Move an existing article to another author
pub(crate) async fn set_article_author(
    conn: &mut SqliteConnection,
    id: i64,
    author_id: Option<i64>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE articles SET author_id = ? WHERE id = ?")
        .bind(author_id)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT id, title, author_id FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    Ok(row.map(|row| row_to_article_sqlite(&row)))
}

async fn get_article_by_title_sqlite(pool: &SqlitePool, title: &str) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT id, title, author_id FROM articles WHERE title = ?")
        .bind(title)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by title")?;

    Ok(row.map(|row| row_to_article_sqlite(&row)))
}

async fn list_articles_sqlite(pool: &SqlitePool) -> Result<Vec<Article>> {
    let rows = sqlx::query("SELECT id, title, author_id FROM articles ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    Ok(rows.iter().map(row_to_article_sqlite).collect())
}

async fn list_articles_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, author_id
        FROM articles
        WHERE author_id = ?
        ORDER BY id
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list articles by author")?;

    Ok(rows.iter().map(row_to_article_sqlite).collect())
}

async fn list_articles_by_tag_sqlite(pool: &SqlitePool, tag_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id, a.title, a.author_id
        FROM articles a
        INNER JOIN article_tags at ON a.id = at.article_id
        WHERE at.tag_id = ?
        ORDER BY a.id
        "#,
    )
    .bind(tag_id)
    .fetch_all(pool)
    .await
    .context("Failed to list articles by tag")?;

    Ok(rows.iter().map(row_to_article_sqlite).collect())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        author_id: row.get("author_id"),
    }
}
