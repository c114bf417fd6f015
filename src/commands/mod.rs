//! Command-line procedures
//!
//! Each procedure takes the store explicitly and writes its human-readable
//! output to the given writer (stdout when run from the binary).
//!
//! - `init-db`: drop and recreate every table
//! - `one-to-one`, `one-to-many`, `many-to-many`: the relationship
//!   walkthroughs
//! - `shell`: interactive inspector over the store

pub mod dbinit;
pub mod many_to_many;
pub mod one_to_many;
pub mod one_to_one;
pub mod shell;
