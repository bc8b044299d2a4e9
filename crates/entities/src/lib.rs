//! Core entity definitions for the todo service.
//!
//! This crate defines the data types shared across the application:
//! users, todos, and aggregate completion statistics.

mod todo;
mod user;

pub use todo::*;
pub use user::*;
