//! Service layer for the migration.
//!
//! Row conversion, duplicate resolution and the staged migrator live here,
//! separated from the CLI so they can be driven from tests.

pub mod convert;
pub mod images;
pub mod migrate;
pub mod password;
pub mod resolve;

pub use migrate::{MigrateError, MigrationEvent, MigrationReport, Migrator, Stage};
