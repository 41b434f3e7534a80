//! RepairTicket entity definitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, UserSummary};

/// Kind of device brought in for repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Laptop,
    Desktop,
    Phone,
    Tablet,
    Other,
}

impl DeviceType {
    /// All device types in display order.
    pub const ALL: [DeviceType; 5] = [
        Self::Laptop,
        Self::Desktop,
        Self::Phone,
        Self::Tablet,
        Self::Other,
    ];

    /// Converts the device type to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Laptop => "Laptop",
            Self::Desktop => "Desktop",
            Self::Phone => "Phone",
            Self::Tablet => "Tablet",
            Self::Other => "Other",
        }
    }

    /// Parses a device type from its stored string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Converts the priority to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parses a priority from its stored string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    /// Sort weight; higher is more urgent. Unrecognised priorities weigh 0.
    pub fn rank(priority: Option<Self>) -> u8 {
        match priority {
            Some(Self::High) => 3,
            Some(Self::Medium) => 2,
            Some(Self::Low) => 1,
            None => 0,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a ticket.
///
/// Older records may carry `Open` or `Closed`; those are accepted as aliases
/// of `Submitted` and `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    #[serde(alias = "Open")]
    Submitted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Awaiting Parts")]
    AwaitingParts,
    #[serde(alias = "Closed")]
    Completed,
}

impl TicketStatus {
    /// Converts the status to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::InProgress => "In Progress",
            Self::AwaitingParts => "Awaiting Parts",
            Self::Completed => "Completed",
        }
    }

    /// Parses a canonical or legacy status value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" | "open" => Some(Self::Submitted),
            "in progress" => Some(Self::InProgress),
            "awaiting parts" => Some(Self::AwaitingParts),
            "completed" | "closed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Lenient loader for persisted values: anything unrecognised falls back
    /// to the default status instead of failing.
    pub fn resolve(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Returns true once the repair is finished.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown ticket status: {s}"))
    }
}

/// A single entry in a ticket's conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    /// Role of the author at the time of writing.
    pub sender: Role,
    /// Message body.
    pub text: String,
    /// When the message was appended.
    pub created_at: DateTime<Utc>,
}

impl TicketMessage {
    /// Creates a message stamped with the current time.
    pub fn new(sender: Role, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A device repair request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairTicket {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user. Never changes after creation.
    pub user: Uuid,
    /// Kind of device.
    pub device_type: DeviceType,
    /// Problem description.
    pub description: String,
    /// Urgency.
    pub priority: Priority,
    /// Current lifecycle status.
    pub status: TicketStatus,
    /// Assigned technician name.
    pub technician: Option<String>,
    /// Estimated repair cost.
    pub estimated_cost: f64,
    /// Internal notes, visible to staff.
    pub notes: Option<String>,
    /// Conversation log in append order.
    pub messages: Vec<TicketMessage>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl RepairTicket {
    /// Creates a new ticket owned by `user` with default status and cost.
    pub fn new(user: Uuid, device_type: DeviceType, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            device_type,
            description: description.into(),
            priority: Priority::default(),
            status: TicketStatus::default(),
            technician: None,
            estimated_cost: 0.0,
            notes: None,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns true if `user_id` owns this ticket.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user == user_id
    }
}

/// Partial update applied by staff. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub technician: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

impl TicketUpdate {
    /// Returns true if no field would change.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.technician.is_none()
            && self.estimated_cost.is_none()
            && self.notes.is_none()
    }

    /// Merges the provided fields into `ticket`.
    ///
    /// An empty technician name unassigns the ticket.
    pub fn apply_to(&self, ticket: &mut RepairTicket) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(technician) = &self.technician {
            ticket.technician = normalize_technician(technician);
        }
        if let Some(cost) = self.estimated_cost {
            ticket.estimated_cost = cost;
        }
        if let Some(notes) = &self.notes {
            ticket.notes = Some(notes.clone());
        }
    }
}

/// Trims a technician name, mapping blank input to no technician.
pub fn normalize_technician(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A ticket joined with its owner's public details.
///
/// `owner` is `None` when the owning account can no longer be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketWithOwner {
    pub ticket: RepairTicket,
    pub owner: Option<UserSummary>,
}
