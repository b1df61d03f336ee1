//! Infrastructure layer for Rolecall.
//!
//! Contains implementations of the repository traits defined in `rolecall-core`
//! (SQLite storage), plus the `config.toml` loader and data directory layout.

pub mod config;
pub mod filesystem;
pub mod sqlite;
