//! Authentication and authorization for RepairDesk.
//!
//! This crate provides:
//! - Signed, time-limited bearer credentials (JWT)
//! - Salted one-way password hashing (argon2id)
//! - The request principal and the guard checks every route composes

mod error;
mod guard;
mod jwt;
mod password;

pub use error::*;
pub use guard::*;
pub use jwt::*;
pub use password::*;

/// Credential lifetime: 30 days.
pub const DEFAULT_JWT_EXPIRATION_HOURS: u64 = 30 * 24;

/// Default JWT issuer.
pub const DEFAULT_JWT_ISSUER: &str = "repairdesk";
