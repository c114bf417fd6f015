//! Unit of work
//!
//! A `Session` stages inserts and relationship links in memory and flushes
//! them to storage in a single transaction on [`Session::commit`]. Nothing
//! is visible to readers, and no ID is assigned, until the commit succeeds.
//!
//! Staged rows are addressed by typed [`Handle`]s. Every relationship can be
//! established from either side, and all mechanisms end up as the same rows:
//!
//! | Relationship | Links |
//! |---|---|
//! | User ↔ UserData | `set_user`, `set_userdata`, `set_user_id` |
//! | Author → Article | `set_author`, `append_article`, `set_author_id` |
//! | Article ↔ Tag | `append_tag_article`, `append_article_tag` |
//!
//! # Usage
//!
//! ```ignore
//! let mut session = store.session();
//! let author = session.add_author("J.sky");
//! let article = session.add_article("一对一关系");
//! session.append_article(author, article);
//! session.commit().await?;
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::SqliteConnection;

use super::error::StoreError;
use super::repositories::article::{insert_article, set_article_author};
use super::repositories::author::insert_author;
use super::repositories::tag::{insert_tag, link_article_tag};
use super::repositories::user::insert_user;
use super::repositories::user_data::{insert_user_data, release_user, set_user_data_owner};
use super::DynDatabasePool;
use crate::models::{Article, Author, Entity, EntityKind, Tag, User, UserData};

/// Typed reference to a row staged in (or attached to) a session.
///
/// Handles are only meaningful to the session that issued them; another
/// session treats them as unknown.
pub struct Handle<T> {
    session: u64,
    index: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(session: u64, index: usize) -> Self {
        Self {
            session,
            index,
            _entity: PhantomData,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.session.hash(state);
        self.index.hash(state);
    }
}

impl<T: Entity> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({})", T::KIND, self.index)
    }
}

/// What was written by a successful commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Rows inserted
    pub inserted: usize,
    /// Foreign keys rewritten on rows that were already stored
    pub updated: usize,
    /// New article ↔ tag associations
    pub linked: usize,
}

#[derive(Debug, Clone)]
enum Slot {
    Pending(Insert),
    Stored(i64),
    Discarded,
}

#[derive(Debug, Clone)]
enum Insert {
    User { name: String },
    UserData { email: String },
    Author { name: String },
    Article { title: String },
    Tag { name: String },
}

impl Insert {
    fn kind(&self) -> EntityKind {
        match self {
            Insert::User { .. } => EntityKind::User,
            Insert::UserData { .. } => EntityKind::UserData,
            Insert::Author { .. } => EntityKind::Author,
            Insert::Article { .. } => EntityKind::Article,
            Insert::Tag { .. } => EntityKind::Tag,
        }
    }
}

/// Far end of a foreign key: another slot, or a raw ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Slot(usize),
    Id(i64),
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Slot index no session ever allocates; resolving it fails
const FOREIGN: usize = usize::MAX;

/// Rows without foreign keys come first so later inserts can resolve them
const INSERT_ORDER: [EntityKind; 5] = [
    EntityKind::User,
    EntityKind::Author,
    EntityKind::Tag,
    EntityKind::Article,
    EntityKind::UserData,
];

/// Staged inserts and links, flushed together on commit
pub struct Session {
    id: u64,
    pool: DynDatabasePool,
    slots: Vec<Slot>,
    /// user_data slot → user
    owners: Vec<(usize, Target)>,
    /// article slot → author
    authors: Vec<(usize, Target)>,
    /// (article slot, tag slot)
    tags: BTreeSet<(usize, usize)>,
}

impl Session {
    /// Start an empty session on the given pool
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            pool,
            slots: Vec::new(),
            owners: Vec::new(),
            authors: Vec::new(),
            tags: BTreeSet::new(),
        }
    }

    pub fn add_user(&mut self, name: impl Into<String>) -> Handle<User> {
        self.stage(Insert::User { name: name.into() })
    }

    pub fn add_user_data(&mut self, email: impl Into<String>) -> Handle<UserData> {
        self.stage(Insert::UserData {
            email: email.into(),
        })
    }

    pub fn add_author(&mut self, name: impl Into<String>) -> Handle<Author> {
        self.stage(Insert::Author { name: name.into() })
    }

    pub fn add_article(&mut self, title: impl Into<String>) -> Handle<Article> {
        self.stage(Insert::Article {
            title: title.into(),
        })
    }

    pub fn add_tag(&mut self, name: impl Into<String>) -> Handle<Tag> {
        self.stage(Insert::Tag { name: name.into() })
    }

    /// Handle for a row that is already stored.
    ///
    /// The ID isn't checked here; a dangling one fails the commit that
    /// first links through it.
    pub fn attach<T: Entity>(&mut self, id: i64) -> Handle<T> {
        self.slots.push(Slot::Stored(id));
        Handle::new(self.id, self.slots.len() - 1)
    }

    /// Link user data to its user (`userdata.user = user`)
    pub fn set_user(&mut self, data: Handle<UserData>, user: Handle<User>) {
        self.link_owner(self.slot(data), Target::Slot(self.slot(user)));
    }

    /// Link a user to its user data (`user.userdata = data`)
    pub fn set_userdata(&mut self, user: Handle<User>, data: Handle<UserData>) {
        self.link_owner(self.slot(data), Target::Slot(self.slot(user)));
    }

    /// Link user data to a user by ID (`userdata.user_id = id`)
    pub fn set_user_id(&mut self, data: Handle<UserData>, user_id: i64) {
        self.link_owner(self.slot(data), Target::Id(user_id));
    }

    /// Assign an article's author by ID (`article.author_id = id`)
    pub fn set_author_id(&mut self, article: Handle<Article>, author_id: i64) {
        self.link_author(self.slot(article), Target::Id(author_id));
    }

    /// Assign an article's author (`article.author = author`)
    pub fn set_author(&mut self, article: Handle<Article>, author: Handle<Author>) {
        self.link_author(self.slot(article), Target::Slot(self.slot(author)));
    }

    /// Append to an author's articles (`author.articles.append(article)`)
    pub fn append_article(&mut self, author: Handle<Author>, article: Handle<Article>) {
        self.link_author(self.slot(article), Target::Slot(self.slot(author)));
    }

    /// Append to a tag's articles (`tag.articles.append(article)`)
    pub fn append_tag_article(&mut self, tag: Handle<Tag>, article: Handle<Article>) {
        self.tags.insert((self.slot(article), self.slot(tag)));
    }

    /// Append to an article's tags (`article.tags.append(tag)`)
    pub fn append_article_tag(&mut self, article: Handle<Article>, tag: Handle<Tag>) {
        self.tags.insert((self.slot(article), self.slot(tag)));
    }

    /// Generated (or attached) ID, once the row is in storage
    pub fn id_of<T>(&self, handle: Handle<T>) -> Option<i64> {
        match self.slots.get(self.slot(handle)) {
            Some(Slot::Stored(id)) => Some(*id),
            _ => None,
        }
    }

    /// Whether anything is waiting for a commit
    pub fn has_pending(&self) -> bool {
        self.slots.iter().any(|slot| matches!(slot, Slot::Pending(_)))
            || !self.owners.is_empty()
            || !self.authors.is_empty()
            || !self.tags.is_empty()
    }

    /// Flush every staged insert and link in one transaction.
    ///
    /// On failure nothing is written, the staged work is discarded and the
    /// handles staged since the last commit never receive an ID.
    pub async fn commit(&mut self) -> Result<CommitSummary, StoreError> {
        match self.flush().await {
            Ok((ids, summary)) => {
                for (slot, id) in self.slots.iter_mut().zip(ids) {
                    if let (true, Some(id)) = (matches!(slot, Slot::Pending(_)), id) {
                        *slot = Slot::Stored(id);
                    }
                }
                self.clear_links();
                tracing::debug!(
                    "Session committed: {} inserted, {} updated, {} linked",
                    summary.inserted,
                    summary.updated,
                    summary.linked
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!("Commit failed, staged work discarded: {}", err);
                self.discard();
                Err(err)
            }
        }
    }

    /// Discard staged work without touching storage
    pub fn rollback(&mut self) {
        self.discard();
    }

    fn stage<T>(&mut self, insert: Insert) -> Handle<T> {
        self.slots.push(Slot::Pending(insert));
        Handle::new(self.id, self.slots.len() - 1)
    }

    fn slot<T>(&self, handle: Handle<T>) -> usize {
        if handle.session == self.id {
            handle.index
        } else {
            FOREIGN
        }
    }

    /// Stored slots are addressed by ID so an attached row and its raw ID
    /// compare equal
    fn target(&self, target: Target) -> Target {
        match target {
            Target::Slot(index) => match self.slots.get(index) {
                Some(Slot::Stored(id)) => Target::Id(*id),
                _ => target,
            },
            Target::Id(_) => target,
        }
    }

    fn link_owner(&mut self, data: usize, user: Target) {
        // Both sides are one-to-one: a newer link replaces any older one
        // staged for the same user data or the same user.
        let user = self.target(user);
        self.owners.retain(|(d, u)| *d != data && *u != user);
        self.owners.push((data, user));
    }

    fn link_author(&mut self, article: usize, author: Target) {
        let author = self.target(author);
        self.authors.retain(|(a, _)| *a != article);
        self.authors.push((article, author));
    }

    fn owner_of(&self, data: usize) -> Option<Target> {
        self.owners
            .iter()
            .find(|(d, _)| *d == data)
            .map(|(_, user)| *user)
    }

    fn author_of(&self, article: usize) -> Option<Target> {
        self.authors
            .iter()
            .find(|(a, _)| *a == article)
            .map(|(_, author)| *author)
    }

    fn is_pending(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Pending(_)))
    }

    fn clear_links(&mut self) {
        self.owners.clear();
        self.authors.clear();
        self.tags.clear();
    }

    fn discard(&mut self) {
        for slot in &mut self.slots {
            if matches!(slot, Slot::Pending(_)) {
                *slot = Slot::Discarded;
            }
        }
        self.clear_links();
    }

    async fn flush(&self) -> Result<(Vec<Option<i64>>, CommitSummary), StoreError> {
        let mut ids: Vec<Option<i64>> = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Stored(id) => Some(*id),
                _ => None,
            })
            .collect();
        let mut summary = CommitSummary::default();

        // Dropped without commit on any error below, which rolls it back
        let mut tx = self.pool.sqlite().begin().await?;

        for kind in INSERT_ORDER {
            for (index, slot) in self.slots.iter().enumerate() {
                let Slot::Pending(insert) = slot else {
                    continue;
                };
                if insert.kind() != kind {
                    continue;
                }
                let id = self.insert_row(&mut *tx, index, insert, &ids).await?;
                ids[index] = Some(id);
                summary.inserted += 1;
            }
        }

        // Pending rows took their links at insert time. Anything else must
        // resolve to a stored row, so discarded and foreign handles fail here.
        for &(article, author) in &self.authors {
            if self.is_pending(article) {
                continue;
            }
            let article_id = resolve(&ids, Target::Slot(article))?;
            let author_id = resolve(&ids, author)?;
            set_article_author(&mut *tx, article_id, Some(author_id)).await?;
            summary.updated += 1;
        }

        for &(data, user) in &self.owners {
            if self.is_pending(data) {
                continue;
            }
            let data_id = resolve(&ids, Target::Slot(data))?;
            let user_id = resolve(&ids, user)?;
            release_user(&mut *tx, user_id, Some(data_id)).await?;
            set_user_data_owner(&mut *tx, data_id, Some(user_id)).await?;
            summary.updated += 1;
        }

        for &(article, tag) in &self.tags {
            let article_id = resolve(&ids, Target::Slot(article))?;
            let tag_id = resolve(&ids, Target::Slot(tag))?;
            if link_article_tag(&mut *tx, article_id, tag_id).await? {
                summary.linked += 1;
            }
        }

        tx.commit().await?;
        Ok((ids, summary))
    }

    async fn insert_row(
        &self,
        conn: &mut SqliteConnection,
        index: usize,
        insert: &Insert,
        ids: &[Option<i64>],
    ) -> Result<i64, StoreError> {
        let id = match insert {
            Insert::User { name } => insert_user(conn, name).await?,
            Insert::Author { name } => insert_author(conn, name).await?,
            Insert::Tag { name } => insert_tag(conn, name).await?,
            Insert::Article { title } => {
                let author_id = self
                    .author_of(index)
                    .map(|author| resolve(ids, author))
                    .transpose()?;
                insert_article(conn, title, author_id).await?
            }
            Insert::UserData { email } => {
                let user_id = self
                    .owner_of(index)
                    .map(|user| resolve(ids, user))
                    .transpose()?;
                if let Some(user_id) = user_id {
                    release_user(conn, user_id, None).await?;
                }
                insert_user_data(conn, email, user_id).await?
            }
        };
        Ok(id)
    }
}

fn resolve(ids: &[Option<i64>], target: Target) -> Result<i64, StoreError> {
    match target {
        Target::Id(id) => Ok(id),
        Target::Slot(index) => ids
            .get(index)
            .copied()
            .flatten()
            .ok_or(StoreError::UnknownHandle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_store, schema, Store};
    use proptest::prelude::*;

    async fn setup() -> Store {
        create_test_store()
            .await
            .expect("Failed to create test store")
    }

    async fn total_rows(store: &Store) -> i64 {
        schema::table_counts(store.pool())
            .await
            .expect("Failed to count rows")
            .iter()
            .map(|(_, count)| count)
            .sum()
    }

    #[tokio::test]
    async fn test_ids_assigned_only_after_commit() {
        let store = setup().await;
        let mut session = store.session();

        let user = session.add_user("baby");
        assert_eq!(session.id_of(user), None);
        assert!(session.has_pending());
        assert!(store.users().get_by_name("baby").await.unwrap().is_none());

        let summary = session.commit().await.expect("Commit should succeed");

        assert_eq!(summary.inserted, 1);
        assert!(!session.has_pending());
        let id = session.id_of(user).expect("User should have an ID");
        let stored = store.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "baby");
    }

    #[tokio::test]
    async fn test_one_to_one_from_data_side() {
        let store = setup().await;
        let mut session = store.session();
        let user = session.add_user("baby");
        session.commit().await.unwrap();

        let data = session.add_user_data("bosi@qq.com");
        session.set_user(data, user);
        session.commit().await.unwrap();

        let user = store
            .users()
            .get_by_id(session.id_of(user).unwrap())
            .await
            .unwrap()
            .unwrap();
        let data = store.userdata_of(&user).await.unwrap().expect("Missing user data");
        assert_eq!(data.email, "bosi@qq.com");
        assert_eq!(store.user_of(&data).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_one_to_one_from_user_side() {
        let store = setup().await;
        let mut session = store.session();
        let user = session.add_user("baby");
        let data = session.add_user_data("bosi@qq.com");
        session.set_userdata(user, data);
        session.commit().await.unwrap();

        let data_id = session.id_of(data).unwrap();
        let data = store.user_data().get_by_id(data_id).await.unwrap().unwrap();
        let owner = store.user_of(&data).await.unwrap().expect("Missing user");
        assert_eq!(Some(owner.id), session.id_of(user));
        assert_eq!(store.userdata_of(&owner).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_set_user_id() {
        let store = setup().await;
        let mut session = store.session();
        let user = session.add_user("baby");
        session.commit().await.unwrap();
        let user_id = session.id_of(user).unwrap();

        let data = session.add_user_data("bosi@qq.com");
        session.set_user_id(data, user_id);
        session.commit().await.unwrap();

        let found = store.user_data().get_by_user_id(user_id).await.unwrap();
        assert_eq!(found.map(|d| d.id), session.id_of(data));
    }

    #[tokio::test]
    async fn test_new_userdata_replaces_previous_link() {
        let store = setup().await;
        let mut session = store.session();
        let user = session.add_user("baby");
        let first = session.add_user_data("old@example.com");
        session.set_user(first, user);
        session.commit().await.unwrap();

        let second = session.add_user_data("new@example.com");
        session.set_userdata(user, second);
        session.commit().await.unwrap();

        let user_id = session.id_of(user).unwrap();
        let current = store.user_data().get_by_user_id(user_id).await.unwrap().unwrap();
        assert_eq!(Some(current.id), session.id_of(second));

        let old = store
            .user_data()
            .get_by_id(session.id_of(first).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(old.user_id.is_none());
    }

    #[tokio::test]
    async fn test_relinking_stored_userdata() {
        let store = setup().await;
        let mut session = store.session();
        let user = session.add_user("baby");
        let first = session.add_user_data("a@example.com");
        let second = session.add_user_data("b@example.com");
        session.set_user(first, user);
        session.commit().await.unwrap();

        session.set_user(second, user);
        let summary = session.commit().await.unwrap();

        assert_eq!(summary.updated, 1);
        let user_id = session.id_of(user).unwrap();
        let current = store.user_data().get_by_user_id(user_id).await.unwrap().unwrap();
        assert_eq!(Some(current.id), session.id_of(second));
    }

    #[tokio::test]
    async fn test_one_to_many_three_mechanisms() {
        let store = setup().await;
        let mut session = store.session();
        let author = session.add_author("J.sky");
        session.commit().await.unwrap();
        let author_id = session.id_of(author).unwrap();

        let by_id = session.add_article("一对一关系");
        session.set_author_id(by_id, author_id);
        let by_ref = session.add_article("多对多关系");
        session.set_author(by_ref, author);
        let by_append = session.add_article("添加append测试");
        session.append_article(author, by_append);
        session.commit().await.unwrap();

        let author = store.authors().get_by_id(author_id).await.unwrap().unwrap();
        let articles = store.articles_of_author(&author).await.unwrap();

        let ids: Vec<Option<i64>> = articles.iter().map(|a| Some(a.id)).collect();
        assert_eq!(
            ids,
            vec![session.id_of(by_id), session.id_of(by_ref), session.id_of(by_append)]
        );
        for article in &articles {
            assert_eq!(store.author_of(article).await.unwrap().as_ref(), Some(&author));
        }
    }

    #[tokio::test]
    async fn test_reassigning_author_before_commit() {
        let store = setup().await;
        let mut session = store.session();
        let first = session.add_author("first");
        let second = session.add_author("second");
        let article = session.add_article("moved");
        session.append_article(first, article);
        session.set_author(article, second);
        session.commit().await.unwrap();

        let first = store.authors().get_by_name("first").await.unwrap().unwrap();
        let second = store.authors().get_by_name("second").await.unwrap().unwrap();
        assert!(store.articles_of_author(&first).await.unwrap().is_empty());
        assert_eq!(store.articles_of_author(&second).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_many_to_many_both_directions() {
        let store = setup().await;
        let mut session = store.session();
        let a1 = session.add_article("我是王大锤");
        let a2 = session.add_article("小狗露西很可爱");
        let a3 = session.add_article("快乐的写代码");
        let t1 = session.add_tag("分类1");
        let t2 = session.add_tag("分类2");
        session.append_tag_article(t1, a1);
        session.append_tag_article(t1, a2);
        session.append_tag_article(t2, a2);
        session.append_article_tag(a3, t2);
        let summary = session.commit().await.unwrap();

        assert_eq!(summary.inserted, 5);
        assert_eq!(summary.linked, 4);

        let t1 = store.tags().get_by_id(session.id_of(t1).unwrap()).await.unwrap().unwrap();
        let titles: Vec<String> = store
            .articles_of_tag(&t1)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["我是王大锤", "小狗露西很可爱"]);

        let a2 = store
            .articles()
            .get_by_id(session.id_of(a2).unwrap())
            .await
            .unwrap()
            .unwrap();
        let tags: Vec<String> = store
            .tags_of_article(&a2)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(tags, vec!["分类1", "分类2"]);
    }

    #[tokio::test]
    async fn test_duplicate_append_collapses() {
        let store = setup().await;
        let mut session = store.session();
        let article = session.add_article("once");
        let tag = session.add_tag("t");
        session.append_tag_article(tag, article);
        session.append_article_tag(article, tag);
        session.append_tag_article(tag, article);
        let summary = session.commit().await.unwrap();
        assert_eq!(summary.linked, 1);

        // Re-appending an association that is already stored is a no-op
        session.append_tag_article(tag, article);
        let summary = session.commit().await.unwrap();
        assert_eq!(summary.linked, 0);

        let tag = store.tags().get_by_name("t").await.unwrap().unwrap();
        assert_eq!(store.articles_of_tag(&tag).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_fails_without_partial_rows() {
        let store = setup().await;
        let mut session = store.session();
        let first = session.add_user("baby");
        session.add_author("J.sky");
        session.add_user("baby");

        let err = session.commit().await.expect_err("Duplicate name should fail");

        assert!(err.is_constraint_violation(), "unexpected error: {:?}", err);
        assert_eq!(session.id_of(first), None);
        assert!(!session.has_pending());
        assert_eq!(total_rows(&store).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_against_stored_row() {
        let store = setup().await;
        let mut session = store.session();
        session.add_tag("分类1");
        session.commit().await.unwrap();

        session.add_tag("分类2");
        session.add_tag("分类1");
        let err = session.commit().await.unwrap_err();

        assert!(err.is_constraint_violation());
        assert_eq!(store.tags().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dangling_author_is_referential_integrity() {
        let store = setup().await;
        let mut session = store.session();
        let author = session.add_author("J.sky");
        let article = session.add_article("orphan");
        session.set_author_id(article, 999);

        let err = session.commit().await.expect_err("Dangling FK should fail");

        assert!(err.is_referential_integrity(), "unexpected error: {:?}", err);
        assert_eq!(session.id_of(author), None);
        assert_eq!(session.id_of(article), None);
        assert_eq!(total_rows(&store).await, 0);
    }

    #[tokio::test]
    async fn test_dangling_attached_row_fails() {
        let store = setup().await;
        let mut session = store.session();
        let article = session.add_article("a");
        let ghost = session.attach::<Tag>(404);
        session.append_article_tag(article, ghost);

        let err = session.commit().await.unwrap_err();

        assert!(err.is_referential_integrity());
        assert!(store.articles().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_work() {
        let store = setup().await;
        let mut session = store.session();
        let kept = session.add_user("kept");
        session.commit().await.unwrap();

        let dropped = session.add_user("dropped");
        session.rollback();
        let summary = session.commit().await.unwrap();

        assert_eq!(summary, CommitSummary::default());
        assert!(session.id_of(kept).is_some());
        assert_eq!(session.id_of(dropped), None);
        assert_eq!(store.users().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_discarded_handle_cannot_be_linked() {
        let store = setup().await;
        let mut session = store.session();
        let article = session.add_article("gone");
        session.rollback();

        let tag = session.add_tag("t");
        session.append_tag_article(tag, article);
        let err = session.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::UnknownHandle));
        assert!(store.tags().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discarded_article_cannot_take_author() {
        let store = setup().await;
        let mut session = store.session();
        let author = session.add_author("J.sky");
        session.commit().await.unwrap();

        let article = session.add_article("gone");
        session.rollback();
        session.set_author(article, author);
        let err = session.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::UnknownHandle), "unexpected error: {:?}", err);
        assert!(store.articles().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discarded_user_data_cannot_take_user() {
        let store = setup().await;
        let mut session = store.session();
        let user = session.add_user("baby");
        session.commit().await.unwrap();

        let data = session.add_user_data("gone@example.com");
        session.rollback();
        session.set_user(data, user);
        let err = session.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::UnknownHandle), "unexpected error: {:?}", err);
        assert!(store.user_data().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_from_another_session_is_unknown() {
        let store = setup().await;
        let mut first = store.session();
        let tag = first.add_tag("first-tag");
        first.commit().await.unwrap();

        let mut second = store.session();
        let article = second.add_article("second-article");
        assert_eq!(second.id_of(tag), None);
        second.append_article_tag(article, tag);
        let err = second.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::UnknownHandle), "unexpected error: {:?}", err);
        assert!(store.articles().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attached_user_and_raw_id_are_the_same_owner() {
        let store = setup().await;
        let mut first = store.session();
        let user = first.add_user("baby");
        first.commit().await.unwrap();
        let user_id = first.id_of(user).unwrap();

        let mut second = store.session();
        let attached = second.attach::<User>(user_id);
        let replaced = second.add_user_data("old@example.com");
        let current = second.add_user_data("new@example.com");
        second.set_user(replaced, attached);
        second.set_user_id(current, user_id);
        second.commit().await.unwrap();

        let owned = store.user_data().get_by_user_id(user_id).await.unwrap().unwrap();
        assert_eq!(Some(owned.id), second.id_of(current));
        let replaced = store
            .user_data()
            .get_by_id(second.id_of(replaced).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(replaced.user_id.is_none());
    }

    #[tokio::test]
    async fn test_attach_links_existing_rows() {
        let store = setup().await;
        let mut first = store.session();
        let article = first.add_article("stored");
        let tag = first.add_tag("stored-tag");
        first.commit().await.unwrap();
        let article_id = first.id_of(article).unwrap();
        let tag_id = first.id_of(tag).unwrap();

        let mut second = store.session();
        let article = second.attach::<Article>(article_id);
        let tag = second.attach::<Tag>(tag_id);
        assert_eq!(second.id_of(article), Some(article_id));
        second.append_article_tag(article, tag);
        let summary = second.commit().await.unwrap();

        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.linked, 1);
        let tags = store.tags().get_by_article_id(article_id).await.unwrap();
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_handle_debug() {
        let handle: Handle<Article> = Handle::new(1, 3);
        assert_eq!(format!("{:?}", handle), "Handle<Article>(3)");
    }

    // Whatever the order and side of the appends, both navigations read
    // back exactly the set of distinct pairs.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn property_many_to_many_symmetry(
            links in prop::collection::vec((0usize..3, 0usize..2, any::<bool>()), 0..12)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let store = setup().await;
                let mut session = store.session();
                let articles: Vec<Handle<Article>> =
                    (0..3).map(|i| session.add_article(format!("article-{}", i))).collect();
                let tags: Vec<Handle<Tag>> =
                    (0..2).map(|i| session.add_tag(format!("tag-{}", i))).collect();

                let mut expected = BTreeSet::new();
                for &(a, t, from_tag) in &links {
                    if from_tag {
                        session.append_tag_article(tags[t], articles[a]);
                    } else {
                        session.append_article_tag(articles[a], tags[t]);
                    }
                    expected.insert((a, t));
                }
                let summary = session.commit().await.expect("Commit should succeed");
                prop_assert_eq!(summary.linked, expected.len());

                let article_ids: Vec<i64> =
                    articles.iter().map(|h| session.id_of(*h).unwrap()).collect();
                let tag_ids: Vec<i64> = tags.iter().map(|h| session.id_of(*h).unwrap()).collect();

                for (t, tag_id) in tag_ids.iter().enumerate() {
                    let tag = store.tags().get_by_id(*tag_id).await.unwrap().unwrap();
                    let found: Vec<i64> =
                        store.articles_of_tag(&tag).await.unwrap().iter().map(|a| a.id).collect();
                    let wanted: Vec<i64> = (0..3)
                        .filter(|a| expected.contains(&(*a, t)))
                        .map(|a| article_ids[a])
                        .collect();
                    prop_assert_eq!(found, wanted);
                }

                for (a, article_id) in article_ids.iter().enumerate() {
                    let article = store.articles().get_by_id(*article_id).await.unwrap().unwrap();
                    let found: Vec<i64> =
                        store.tags_of_article(&article).await.unwrap().iter().map(|t| t.id).collect();
                    let wanted: Vec<i64> = (0..2)
                        .filter(|t| expected.contains(&(a, *t)))
                        .map(|t| tag_ids[t])
                        .collect();
                    prop_assert_eq!(found, wanted);
                }

                Ok(())
            });
            result?;
        }
    }
}
