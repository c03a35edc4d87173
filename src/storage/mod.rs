//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - taxa(tax_id, parent_id, rank, name)
//!
//! The root row is its own parent. Rows are only ever written by a full,
//! transactional replace.

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreSnapshot, DbStats};
