//! Entity kinds
//!
//! Names under which the record types are exposed to the interactive shell.

use std::fmt;
use std::str::FromStr;

use super::{Article, Author, Tag, User, UserData};

/// One of the mapped record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    UserData,
    Author,
    Article,
    Tag,
}

impl EntityKind {
    /// Every kind, in the order the shell lists them
    pub const ALL: [EntityKind; 5] = [
        EntityKind::User,
        EntityKind::UserData,
        EntityKind::Author,
        EntityKind::Article,
        EntityKind::Tag,
    ];

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::UserData => "user_data",
            EntityKind::Author => "authors",
            EntityKind::Article => "articles",
            EntityKind::Tag => "tags",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "User"),
            EntityKind::UserData => write!(f, "UserData"),
            EntityKind::Author => write!(f, "Author"),
            EntityKind::Article => write!(f, "Article"),
            EntityKind::Tag => write!(f, "Tag"),
        }
    }
}

/// A record type with its own table
pub trait Entity {
    const KIND: EntityKind;
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
}

impl Entity for UserData {
    const KIND: EntityKind = EntityKind::UserData;
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;
}

impl Entity for Article {
    const KIND: EntityKind = EntityKind::Article;
}

impl Entity for Tag {
    const KIND: EntityKind = EntityKind::Tag;
}

/// Returned when a name doesn't match any entity kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown entity: {0}")]
pub struct ParseEntityKindError(pub String);

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(EntityKind::User),
            "userdata" | "user_data" => Ok(EntityKind::UserData),
            "author" => Ok(EntityKind::Author),
            "article" => Ok(EntityKind::Article),
            "tag" => Ok(EntityKind::Tag),
            _ => Err(ParseEntityKindError(s.to_string())),
        }
    }
}
