//! Request principal and access guards.

use entities::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, AuthResult};

/// The identity resolved from a bearer credential for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Role at the time of the request.
    pub role: Role,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// An access requirement an operation places on its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any resolved identity.
    Authenticated,
    /// The caller must hold exactly this role.
    Role(Role),
    /// The caller must own the resource (the given owner ID) or be an admin.
    OwnerOrAdmin(Uuid),
}

impl Principal {
    /// Returns true for admin principals.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Evaluates a requirement against this principal.
    pub fn satisfies(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Authenticated => true,
            Requirement::Role(role) => self.role == role,
            Requirement::OwnerOrAdmin(owner) => self.id == owner || self.is_admin(),
        }
    }

    /// Fails with [`AuthError::Forbidden`] unless the requirement holds.
    pub fn require(&self, requirement: Requirement) -> AuthResult<()> {
        if self.satisfies(requirement) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.id, ?requirement, "Access denied");
            Err(AuthError::Forbidden)
        }
    }

    /// Requires the given role.
    pub fn require_role(&self, role: Role) -> AuthResult<()> {
        self.require(Requirement::Role(role))
    }

    /// Requires ownership of a resource owned by `owner`, or the admin role.
    pub fn require_owner_or_admin(&self, owner: Uuid) -> AuthResult<()> {
        self.require(Requirement::OwnerOrAdmin(owner))
    }
}
