//! Ticket storage and querying for RepairDesk
//!
//! This crate provides the storage abstraction for users and repair tickets,
//! including the append-only message log attached to each ticket. It ships
//! a SQLite backend for deployments, an in-memory backend for tests, a
//! timeout decorator that bounds every store call, and the pure query engine
//! used to filter, sort and summarise ticket listings.

mod bounded;
mod error;
mod memory;
mod query;
mod sqlite;
mod traits;

pub use bounded::*;
pub use error::*;
pub use memory::*;
pub use query::*;
pub use sqlite::*;
pub use traits::*;
