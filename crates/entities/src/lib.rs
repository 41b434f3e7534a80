//! Core entity definitions for RepairDesk.
//!
//! This crate defines the data types shared across the RepairDesk service:
//! users and their roles, repair tickets, the per-ticket message log and the
//! advisory status timeline.

mod ticket;
mod timeline;
mod user;

pub use ticket::*;
pub use timeline::*;
pub use user::*;
