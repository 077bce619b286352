//! Storage layer
//!
//! SQLite holds the whole catalog. This module owns the schema, the
//! connection, row mapping and the error type; the catalog operations in
//! `store`, `tags`, `sharing`, `transfer` and `cleanup` build on it.

pub mod database;
pub mod error;
pub mod schema;

pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
