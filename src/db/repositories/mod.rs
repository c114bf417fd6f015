//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository reads one entity and serves the relationship
//! navigations that end at that entity. Writes go through
//! [`Session`](crate::db::Session).

pub mod article;
pub mod author;
pub mod tag;
pub mod user;
pub mod user_data;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use user_data::{SqlxUserDataRepository, UserDataRepository};
