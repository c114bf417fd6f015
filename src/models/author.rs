//! Author model

use serde::{Deserialize, Serialize};

/// Author entity, the "one" side of the author → articles relationship
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// Unique identifier
    pub id: i64,
    /// Author name (unique)
    pub name: String,
}
