//! Schema declaration
//!
//! The tables behind the record types, embedded as SQL. There is no
//! versioned migration history: the schema is created as a whole and can be
//! rebuilt from scratch with [`rebuild`].
//!
//! # Usage
//!
//! ```ignore
//! use relata::db::{create_pool, schema};
//!
//! let pool = create_pool(&config).await?;
//! schema::rebuild(&pool).await?;
//! ```

use anyhow::{Context, Result};

use super::DynDatabasePool;

/// A table declaration
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name
    pub name: &'static str,
    /// Tables this one holds foreign keys into
    pub references: &'static [&'static str],
    /// SQL creating the table and its indexes
    pub create_sql: &'static str,
}

/// Pure junction table for article ↔ tag, holding only the two foreign keys.
///
/// Declared ahead of the entity tables that reach each other through it.
pub const ARTICLE_TAGS: Table = Table {
    name: "article_tags",
    references: &["articles", "tags"],
    create_sql: r#"
        CREATE TABLE IF NOT EXISTS article_tags (
            tag_id INTEGER NOT NULL REFERENCES tags(id),
            article_id INTEGER NOT NULL REFERENCES articles(id),
            PRIMARY KEY (article_id, tag_id)
        );
        CREATE INDEX IF NOT EXISTS idx_article_tags_tag_id ON article_tags(tag_id);
    "#,
};

/// Every table, in declaration order
pub const TABLES: &[Table] = &[
    // One-to-one: users ↔ user_data. The unique back-reference keeps a user
    // from being claimed by two user_data rows.
    Table {
        name: "users",
        references: &[],
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(32) NOT NULL UNIQUE
            );
        "#,
    },
    Table {
        name: "user_data",
        references: &["users"],
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS user_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(200) NOT NULL,
                user_id INTEGER UNIQUE REFERENCES users(id)
            );
        "#,
    },
    // One-to-many: authors → articles
    Table {
        name: "authors",
        references: &[],
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(32) NOT NULL UNIQUE
            );
        "#,
    },
    // Many-to-many: articles ↔ tags
    ARTICLE_TAGS,
    Table {
        name: "articles",
        references: &["authors"],
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL UNIQUE,
                author_id INTEGER REFERENCES authors(id)
            );
            CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles(author_id);
        "#,
    },
    Table {
        name: "tags",
        references: &[],
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(20) NOT NULL UNIQUE
            );
        "#,
    },
];

/// Create every table that doesn't exist yet
pub async fn create_all(pool: &DynDatabasePool) -> Result<()> {
    for table in TABLES {
        for statement in split_sql_statements(table.create_sql) {
            pool.execute(statement)
                .await
                .with_context(|| format!("Failed to create table {}", table.name))?;
        }
        tracing::debug!("Created table {}", table.name);
    }
    Ok(())
}

/// Drop every table, referencing tables before the tables they reference
pub async fn drop_all(pool: &DynDatabasePool) -> Result<()> {
    for table in drop_order() {
        pool.execute(&format!("DROP TABLE IF EXISTS {}", table.name))
            .await
            .with_context(|| format!("Failed to drop table {}", table.name))?;
        tracing::debug!("Dropped table {}", table.name);
    }
    Ok(())
}

/// Drop and recreate the whole schema, leaving every table empty
pub async fn rebuild(pool: &DynDatabasePool) -> Result<()> {
    drop_all(pool).await?;
    create_all(pool).await?;
    tracing::info!("Schema rebuilt ({} tables)", TABLES.len());
    Ok(())
}

/// Row count of every table, in declaration order
pub async fn table_counts(pool: &DynDatabasePool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.name))
            .fetch_one(pool.sqlite())
            .await
            .with_context(|| format!("Failed to count rows in {}", table.name))?;
        counts.push((table.name, count));
    }
    Ok(counts)
}

/// Tables ordered so nothing is dropped while another table still references it
fn drop_order() -> Vec<&'static Table> {
    let mut remaining: Vec<&'static Table> = TABLES.iter().collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut i = 0;
        while i < remaining.len() {
            let name = remaining[i].name;
            let referenced = remaining
                .iter()
                .any(|other| other.name != name && other.references.contains(&name));
            if referenced {
                i += 1;
            } else {
                ordered.push(remaining.remove(i));
            }
        }
        if remaining.len() == before {
            // Reference cycle: drop the rest in reverse declaration order
            ordered.extend(remaining.drain(..).rev());
        }
    }

    ordered
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}
