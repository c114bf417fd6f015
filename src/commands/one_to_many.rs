//! One-to-many walkthrough: Author → Article
//!
//! Usage: relata one-to-many

use anyhow::{Context, Result};
use std::io::Write;

use crate::db::Store;
use crate::models::{Article, Author};

pub const AUTHOR_NAME: &str = "J.sky";

/// Titles of the three articles, one per linking mechanism
pub const TITLES: [&str; 3] = ["一对一关系", "多对多关系", "添加append测试"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneToManyReport {
    pub author: Author,
    pub articles: Vec<Article>,
}

/// Store an author, then attach three articles to it: by setting the
/// foreign key, by assigning the author, and by appending to the author's
/// articles. Prints every title reached through `author.articles`.
pub async fn execute<W: Write>(store: &Store, out: &mut W) -> Result<OneToManyReport> {
    let mut session = store.session();
    let author = session.add_author(AUTHOR_NAME);
    session.commit().await?;
    let author_id = session.id_of(author).context("Author was not assigned an ID")?;

    let by_id = session.add_article(TITLES[0]);
    session.set_author_id(by_id, author_id);

    let by_reference = session.add_article(TITLES[1]);
    session.set_author(by_reference, author);

    let by_append = session.add_article(TITLES[2]);
    session.append_article(author, by_append);

    session.commit().await?;

    let author = store
        .authors()
        .get_by_id(author_id)
        .await?
        .context("Committed author is missing")?;
    let articles = store.articles_of_author(&author).await?;
    for article in &articles {
        writeln!(out, "{}", article.title)?;
    }

    Ok(OneToManyReport { author, articles })
}
