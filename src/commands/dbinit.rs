//! Schema rebuild
//!
//! Usage: relata init-db

use anyhow::Result;
use std::io::Write;

use crate::db::{schema, Store};

/// Drop every table, then create them all again
pub async fn execute<W: Write>(store: &Store, out: &mut W) -> Result<()> {
    writeln!(out, "删除数据库和表")?;
    schema::drop_all(store.pool()).await?;

    writeln!(out, "创建数据库！")?;
    schema::create_all(store.pool()).await?;

    writeln!(out, "数据库创建成功！")?;
    Ok(())
}
