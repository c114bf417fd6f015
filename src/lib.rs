//! Relata - relationship mapping walkthrough
//!
//! One-to-one, one-to-many and many-to-many relationships over an embedded
//! SQLite database, driven from a handful of command-line procedures and a
//! placeholder HTTP route.

pub mod api;
pub mod commands;
pub mod config;
pub mod db;
pub mod models;
