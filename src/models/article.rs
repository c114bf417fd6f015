//! Article model
//!
//! Articles sit on the "many" side of author → articles and on one side of
//! the article ↔ tag many-to-many relationship.

use serde::{Deserialize, Serialize};

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Article title (unique)
    pub title: String,
    /// Owning author. `None` for articles created without one.
    pub author_id: Option<i64>,
}
