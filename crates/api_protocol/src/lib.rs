//! HTTP API schema for RepairDesk
//!
//! This crate defines the JSON bodies exchanged with the RepairDesk server:
//! request payloads with their validation rules, response shapes built from
//! the core entities, and the uniform error body. All field names are
//! camelCase on the wire.

mod error;
mod requests;
mod responses;

pub use error::*;
pub use requests::*;
pub use responses::*;
