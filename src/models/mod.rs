//! Data models
//!
//! Record shapes for the relationship walkthrough:
//! - `User` ↔ `UserData` (one-to-one)
//! - `Author` → `Article` (one-to-many)
//! - `Article` ↔ `Tag` (many-to-many, through the `article_tags` junction table)
//!
//! Models only carry the row's own columns. Related records are reached
//! through repository accessors, never through live back-pointers.

mod article;
mod author;
mod kind;
mod tag;
mod user;

pub use article::Article;
pub use author::Author;
pub use kind::{Entity, EntityKind, ParseEntityKindError};
pub use tag::Tag;
pub use user::{User, UserData};
