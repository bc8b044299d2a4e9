//! Todo and user storage for the todo service.
//!
//! This crate provides the storage abstraction behind the HTTP surface. It
//! supports both SQLite (embedded, file-backed, for single-process/local
//! use) and PostgreSQL (pooled, for concurrent/production use) behind one
//! trait, plus an in-memory implementation used as a test double.

mod error;
mod memory;
mod postgres;
mod sqlite;
mod store;

pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use sqlite::*;
pub use store::*;
