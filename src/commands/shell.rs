//! Interactive shell
//!
//! Usage: relata shell
//!
//! Prints the shell context (the store and the entity names) and then reads
//! one query per line:
//!
//! ```text
//! >>> User          list every user
//! >>> Article 2     fetch one article, or `None`
//! >>> help
//! >>> exit
//! ```
//!
//! Rows are printed as JSON. Unknown names and malformed IDs are reported
//! and the shell keeps reading; end of input also ends the session.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, Write};

use crate::db::Store;
use crate::models::EntityKind;

const PROMPT: &str = ">>> ";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    Help,
    Exit,
    List(EntityKind),
    Get(EntityKind, i64),
}

/// Run the shell until `exit`, `quit` or end of input
pub async fn execute<R: BufRead, W: Write>(store: &Store, input: R, out: &mut W) -> Result<()> {
    print_context(store, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_query(&line) {
            Ok(Query::Exit) => break,
            Ok(Query::Help) => print_help(out)?,
            Ok(Query::List(kind)) => {
                let rows = list_rows(store, kind).await?;
                if rows.is_empty() {
                    writeln!(out, "[]")?;
                }
                for row in rows {
                    writeln!(out, "{}", row)?;
                }
            }
            Ok(Query::Get(kind, id)) => match get_row(store, kind, id).await? {
                Some(row) => writeln!(out, "{}", row)?,
                None => writeln!(out, "None")?,
            },
            Err(message) => writeln!(out, "{}", message)?,
        }
    }

    tracing::debug!("Shell session ended");
    Ok(())
}

fn print_context<W: Write>(store: &Store, out: &mut W) -> Result<()> {
    let names: Vec<String> = EntityKind::ALL.iter().map(ToString::to_string).collect();
    writeln!(out, "shell上下文: db, {}", names.join(", "))?;
    writeln!(out, "db = {}", store.pool().location())?;
    writeln!(out, "Type `help` for usage, `exit` to leave.")?;
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "<Entity>         list all rows")?;
    writeln!(out, "<Entity> <id>    fetch one row by primary key")?;
    writeln!(out, "exit | quit      leave the shell")?;
    for kind in EntityKind::ALL {
        writeln!(out, "  {:<10} table `{}`", kind.to_string(), kind.table())?;
    }
    Ok(())
}

fn parse_query(line: &str) -> Result<Query, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("Empty query".to_string());
    };

    match head {
        "help" | "?" => return Ok(Query::Help),
        "exit" | "quit" => return Ok(Query::Exit),
        _ => {}
    }

    let kind = head.parse::<EntityKind>().map_err(|e| e.to_string())?;
    let query = match parts.next() {
        None => Query::List(kind),
        Some(raw) => {
            let id = raw
                .parse::<i64>()
                .map_err(|_| format!("Invalid id: {}", raw))?;
            Query::Get(kind, id)
        }
    };

    if let Some(extra) = parts.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    Ok(query)
}

async fn get_row(store: &Store, kind: EntityKind, id: i64) -> Result<Option<Value>> {
    match kind {
        EntityKind::User => to_json(store.users().get_by_id(id).await?),
        EntityKind::UserData => to_json(store.user_data().get_by_id(id).await?),
        EntityKind::Author => to_json(store.authors().get_by_id(id).await?),
        EntityKind::Article => to_json(store.articles().get_by_id(id).await?),
        EntityKind::Tag => to_json(store.tags().get_by_id(id).await?),
    }
}

async fn list_rows(store: &Store, kind: EntityKind) -> Result<Vec<Value>> {
    let rows = match kind {
        EntityKind::User => serde_json::to_value(store.users().list().await?)?,
        EntityKind::UserData => serde_json::to_value(store.user_data().list().await?)?,
        EntityKind::Author => serde_json::to_value(store.authors().list().await?)?,
        EntityKind::Article => serde_json::to_value(store.articles().list().await?)?,
        EntityKind::Tag => serde_json::to_value(store.tags().list().await?)?,
    };

    match rows {
        Value::Array(rows) => Ok(rows),
        other => Ok(vec![other]),
    }
}

fn to_json<T: Serialize>(row: Option<T>) -> Result<Option<Value>> {
    Ok(row.map(serde_json::to_value).transpose()?)
}
