//! One-to-one walkthrough: User ↔ UserData
//!
//! Usage: relata one-to-one

use anyhow::{Context, Result};
use std::io::Write;

use crate::db::Store;
use crate::models::{User, UserData};

pub const USER_NAME: &str = "baby";
pub const USER_EMAIL: &str = "bosi@qq.com";

/// What the walkthrough read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneToOneReport {
    pub user: User,
    pub user_data: UserData,
}

/// Store a user, then link new user data to it through the back-reference
/// and read the email back through `user.userdata`.
pub async fn execute<W: Write>(store: &Store, out: &mut W) -> Result<OneToOneReport> {
    writeln!(out, "开始测试")?;

    let mut session = store.session();
    let user = session.add_user(USER_NAME);
    session.commit().await?;

    let data = session.add_user_data(USER_EMAIL);
    session.set_user(data, user);
    session.commit().await?;

    let user_id = session.id_of(user).context("User was not assigned an ID")?;
    let user = store
        .users()
        .get_by_id(user_id)
        .await?
        .context("Committed user is missing")?;
    let user_data = store
        .userdata_of(&user)
        .await?
        .context("User has no user data")?;
    tracing::debug!("User {} linked to user data {}", user.id, user_data.id);

    writeln!(out, "添加{}成功！", user_data.email)?;
    Ok(OneToOneReport { user, user_data })
}
