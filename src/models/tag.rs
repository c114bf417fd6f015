//! Tag model

use serde::{Deserialize, Serialize};

/// Tag entity.
///
/// Tags and articles are associated freely through the `article_tags`
/// junction table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name (unique)
    pub name: String,
}
