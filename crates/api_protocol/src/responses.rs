//! Response bodies

use chrono::{DateTime, Utc};
use entities::{
    DeviceType, Priority, RepairTicket, Role, TicketMessage, TicketStatus, TicketWithOwner,
    TimelineStep, User, UserSummary, timeline,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ========== Auth Responses ==========

/// Returned by register and login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Bearer credential for subsequent requests
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            token,
        }
    }
}

/// A user profile. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// ========== Ticket Responses ==========

/// Public details of a ticket's owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<UserSummary> for OwnerResponse {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            email: summary.email,
        }
    }
}

/// The `user` field of a ticket: a bare id, or the owner's details in
/// admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketUser {
    Id(Uuid),
    Populated(OwnerResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub sender: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<TicketMessage> for MessageResponse {
    fn from(message: TicketMessage) -> Self {
        Self {
            sender: message.sender,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

/// A ticket as seen by an API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: Uuid,
    pub user: TicketUser,
    pub device_type: DeviceType,
    pub description: String,
    pub priority: Priority,
    pub status: TicketStatus,
    /// Position of `status` in the progress timeline
    pub stage_index: usize,
    /// Per-stage progress for display
    pub timeline: Vec<TimelineStep>,
    pub technician: Option<String>,
    pub estimated_cost: f64,
    /// Staff notes; omitted for non-admin viewers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub messages: Vec<MessageResponse>,
    pub created_at: DateTime<Utc>,
}

impl TicketResponse {
    /// Builds the response, keeping internal notes only when `staff_view`.
    pub fn from_ticket(ticket: RepairTicket, staff_view: bool) -> Self {
        Self {
            id: ticket.id,
            user: TicketUser::Id(ticket.user),
            device_type: ticket.device_type,
            description: ticket.description,
            priority: ticket.priority,
            stage_index: ticket.status.stage_index(),
            timeline: timeline(ticket.status),
            status: ticket.status,
            technician: ticket.technician,
            estimated_cost: ticket.estimated_cost,
            notes: if staff_view { ticket.notes } else { None },
            messages: ticket.messages.into_iter().map(MessageResponse::from).collect(),
            created_at: ticket.created_at,
        }
    }

    /// Builds an admin listing entry with the owner populated when known.
    pub fn with_owner(joined: TicketWithOwner) -> Self {
        let owner = joined.owner;
        let mut response = Self::from_ticket(joined.ticket, true);
        if let Some(owner) = owner {
            response.user = TicketUser::Populated(owner.into());
        }
        response
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
