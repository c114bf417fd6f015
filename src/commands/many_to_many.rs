//! Many-to-many walkthrough: Article ↔ Tag
//!
//! Usage: relata many-to-many

use anyhow::{Context, Result};
use std::io::Write;

use crate::db::Store;
use crate::models::{Article, Tag};

pub const ARTICLE_TITLES: [&str; 3] = ["我是王大锤", "小狗露西很可爱", "快乐的写代码"];
pub const TAG_NAMES: [&str; 2] = ["分类1", "分类2"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyToManyReport {
    /// Articles of the first tag
    pub tag_articles: Vec<Article>,
    /// Tags of the second article
    pub article_tags: Vec<Tag>,
}

/// Tag the first two articles with the first tag and the last two with the
/// second, then print the first tag's articles and the second article's tags.
pub async fn execute<W: Write>(store: &Store, out: &mut W) -> Result<ManyToManyReport> {
    let mut session = store.session();
    let art1 = session.add_article(ARTICLE_TITLES[0]);
    let art2 = session.add_article(ARTICLE_TITLES[1]);
    let art3 = session.add_article(ARTICLE_TITLES[2]);

    let tag1 = session.add_tag(TAG_NAMES[0]);
    let tag2 = session.add_tag(TAG_NAMES[1]);

    session.append_tag_article(tag1, art1);
    session.append_tag_article(tag1, art2);
    session.append_tag_article(tag2, art2);
    session.append_tag_article(tag2, art3);

    let summary = session.commit().await?;
    tracing::debug!("Linked {} article/tag pairs", summary.linked);

    let tag1_id = session.id_of(tag1).context("Tag was not assigned an ID")?;
    let art2_id = session.id_of(art2).context("Article was not assigned an ID")?;

    let tag1 = store
        .tags()
        .get_by_id(tag1_id)
        .await?
        .context("Committed tag is missing")?;
    let tag_articles = store.articles_of_tag(&tag1).await?;
    for article in &tag_articles {
        writeln!(out, "{}", article.title)?;
    }

    let art2 = store
        .articles()
        .get_by_id(art2_id)
        .await?
        .context("Committed article is missing")?;
    let article_tags = store.tags_of_article(&art2).await?;
    for tag in &article_tags {
        writeln!(out, "{}", tag.name)?;
    }

    Ok(ManyToManyReport {
        tag_articles,
        article_tags,
    })
}
