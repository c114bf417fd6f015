//! User model
//!
//! `User` holds the basic profile and `UserData` the extended one. The two
//! are linked one-to-one through `user_data.user_id`, which is unique in
//! storage so a User can be referenced by at most one UserData.

use serde::{Deserialize, Serialize};

/// Basic user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// User name (unique)
    pub name: String,
}

/// Extended user profile, owning side of the one-to-one link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserData {
    /// Unique identifier
    pub id: i64,
    /// Contact email
    pub email: String,
    /// Back-reference to the owning user, if linked
    pub user_id: Option<i64>,
}
