//! Database layer
//!
//! Storage for the relationship model on an embedded SQLite database.
//!
//! # Architecture
//!
//! - [`pool`]: the `DatabasePool` trait and its SQLite implementation
//! - [`schema`]: table declarations, create-all / drop-all
//! - [`repositories`]: read access and relationship navigation per entity
//! - [`session`]: staged inserts and links flushed in one transaction
//! - [`store`]: the explicit store handle bundling all of the above
//!
//! # Usage
//!
//! ```ignore
//! use relata::config::DatabaseConfig;
//! use relata::db::{schema, Store};
//!
//! let store = Store::connect(&DatabaseConfig::default()).await?;
//! schema::rebuild(store.pool()).await?;
//!
//! let mut session = store.session();
//! let user = session.add_user("baby");
//! session.commit().await?;
//!
//! let id = session.id_of(user).expect("committed");
//! let found = store.users().get_by_id(id).await?;
//! ```

pub mod error;
pub mod pool;
pub mod repositories;
pub mod schema;
pub mod session;
pub mod store;

pub use error::StoreError;
pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
pub use session::{CommitSummary, Handle, Session};
pub use store::{create_test_store, Store};
