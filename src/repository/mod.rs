//! Repository layer for both databases.
//!
//! The Joomla side is read through raw SQL on a MySQL connection; the Cyclope
//! side is written with Diesel on SQLite or PostgreSQL.

pub mod cyclope;
pub mod joomla;
pub mod pool;
pub mod util;

pub use cyclope::{CyclopeDb, CyclopeTable, DEFAULT_BATCH_SIZE};
pub use joomla::{JoomlaSource, MysqlJoomlaSource};
pub use pool::{DbError, DbPool};
