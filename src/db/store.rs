//! Store handle
//!
//! `Store` bundles the pool with one repository per entity. It is built
//! explicitly and handed to commands and HTTP handlers; cloning it is cheap.
//!
//! The navigation accessors resolve each side of a relationship with a
//! query, so they always reflect what has been committed.

use anyhow::Result;
use std::sync::Arc;

use super::repositories::{
    ArticleRepository, AuthorRepository, SqlxArticleRepository, SqlxAuthorRepository,
    SqlxTagRepository, SqlxUserDataRepository, SqlxUserRepository, TagRepository,
    UserDataRepository, UserRepository,
};
use super::session::Session;
use super::{create_pool, create_test_pool, schema, DynDatabasePool};
use crate::config::DatabaseConfig;
use crate::models::{Article, Author, Tag, User, UserData};

/// Explicit handle on the relational store
#[derive(Clone)]
pub struct Store {
    pool: DynDatabasePool,
    users: Arc<dyn UserRepository>,
    user_data: Arc<dyn UserDataRepository>,
    authors: Arc<dyn AuthorRepository>,
    articles: Arc<dyn ArticleRepository>,
    tags: Arc<dyn TagRepository>,
}

impl Store {
    /// Wrap an existing pool
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            users: SqlxUserRepository::boxed(pool.clone()),
            user_data: SqlxUserDataRepository::boxed(pool.clone()),
            authors: SqlxAuthorRepository::boxed(pool.clone()),
            articles: SqlxArticleRepository::boxed(pool.clone()),
            tags: SqlxTagRepository::boxed(pool.clone()),
            pool,
        }
    }

    /// Open the database described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        pool.ping().await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &DynDatabasePool {
        &self.pool
    }

    /// Start a new unit of work
    pub fn session(&self) -> Session {
        Session::new(self.pool.clone())
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    pub fn user_data(&self) -> &dyn UserDataRepository {
        self.user_data.as_ref()
    }

    pub fn authors(&self) -> &dyn AuthorRepository {
        self.authors.as_ref()
    }

    pub fn articles(&self) -> &dyn ArticleRepository {
        self.articles.as_ref()
    }

    pub fn tags(&self) -> &dyn TagRepository {
        self.tags.as_ref()
    }

    /// `user.userdata`
    pub async fn userdata_of(&self, user: &User) -> Result<Option<UserData>> {
        self.user_data.get_by_user_id(user.id).await
    }

    /// `userdata.user`
    pub async fn user_of(&self, data: &UserData) -> Result<Option<User>> {
        match data.user_id {
            Some(user_id) => self.users.get_by_id(user_id).await,
            None => Ok(None),
        }
    }

    /// `author.articles`
    pub async fn articles_of_author(&self, author: &Author) -> Result<Vec<Article>> {
        self.articles.list_by_author(author.id).await
    }

    /// `article.author`
    pub async fn author_of(&self, article: &Article) -> Result<Option<Author>> {
        match article.author_id {
            Some(author_id) => self.authors.get_by_id(author_id).await,
            None => Ok(None),
        }
    }

    /// `tag.articles`
    pub async fn articles_of_tag(&self, tag: &Tag) -> Result<Vec<Article>> {
        self.articles.list_by_tag(tag.id).await
    }

    /// `article.tags`
    pub async fn tags_of_article(&self, article: &Article) -> Result<Vec<Tag>> {
        self.tags.get_by_article_id(article.id).await
    }
}

/// In-memory store with the schema already created
pub async fn create_test_store() -> Result<Store> {
    let pool = create_test_pool().await?;
    schema::create_all(&pool).await?;
    Ok(Store::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlinked_navigation_is_empty() {
        let store = create_test_store().await.expect("Failed to create store");
        let mut session = store.session();
        let user = session.add_user("baby");
        let data = session.add_user_data("loose@example.com");
        let article = session.add_article("orphan");
        session.commit().await.unwrap();

        let user = store.users().get_by_id(session.id_of(user).unwrap()).await.unwrap().unwrap();
        let data = store
            .user_data()
            .get_by_id(session.id_of(data).unwrap())
            .await
            .unwrap()
            .unwrap();
        let article = store
            .articles()
            .get_by_id(session.id_of(article).unwrap())
            .await
            .unwrap()
            .unwrap();

        assert!(store.userdata_of(&user).await.unwrap().is_none());
        assert!(store.user_of(&data).await.unwrap().is_none());
        assert!(store.author_of(&article).await.unwrap().is_none());
        assert!(store.tags_of_article(&article).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_the_database() {
        let store = create_test_store().await.expect("Failed to create store");
        let other = store.clone();

        let mut session = store.session();
        session.add_author("J.sky");
        session.commit().await.unwrap();

        assert!(other.authors().get_by_name("J.sky").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_connect_file_database() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: crate::config::sqlite_uri(&temp_dir.path().join("data.db")),
        };

        let store = Store::connect(&config).await.expect("Failed to connect");
        schema::rebuild(store.pool()).await.unwrap();

        let mut session = store.session();
        session.add_tag("分类1");
        session.commit().await.unwrap();
        store.pool().close().await;

        let reopened = Store::connect(&config).await.expect("Failed to reconnect");
        let tags = reopened.tags().list().await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "分类1");
    }
}
