//! Request bodies and query parameters

use entities::{DeviceType, Priority, RepairTicket, Role, TicketStatus, TicketUpdate};
use serde::{Deserialize, Serialize};
use ticket_store::{SortKey, StatusFilter, TicketQuery};
use uuid::Uuid;

use crate::error::{required, ValidationError};

// ========== Auth Requests ==========

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Requested role; defaults to `user`
    pub role: Option<Role>,
}

/// A registration that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<Registration, ValidationError> {
        let name = required("name", &self.name)?;
        let username = required("username", &self.username)?;
        let email = required("email", &self.email)?;
        if !email.contains('@') {
            return Err(ValidationError::invalid("email", "must contain '@'"));
        }
        // Passwords are taken verbatim, surrounding whitespace included.
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => return Err(ValidationError::MissingField("password")),
        };

        Ok(Registration {
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: self.role.unwrap_or_default(),
        })
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns `(username, password)`.
    pub fn credentials(&self) -> Result<(&str, &str), ValidationError> {
        let username = required("username", &self.username)?;
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => return Err(ValidationError::MissingField("password")),
        };
        Ok((username, password))
    }
}

// ========== Ticket Requests ==========

/// Body of `POST /tickets`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub device_type: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
}

impl CreateTicketRequest {
    /// Builds a new ticket owned by `owner`.
    pub fn into_ticket(self, owner: Uuid) -> Result<RepairTicket, ValidationError> {
        let raw_device = required("deviceType", &self.device_type)?;
        let device_type = DeviceType::parse(raw_device).ok_or_else(|| {
            let allowed: Vec<_> = DeviceType::ALL.iter().map(DeviceType::as_str).collect();
            ValidationError::invalid("deviceType", format!("must be one of {}", allowed.join(", ")))
        })?;
        let description = required("description", &self.description)?;

        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => Priority::default(),
            Some(raw) => Priority::parse(raw).ok_or_else(|| {
                ValidationError::invalid("priority", "must be one of Low, Medium, High")
            })?,
        };

        Ok(RepairTicket::new(owner, device_type, description).with_priority(priority))
    }
}

/// Body of `PUT /tickets/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    /// An empty string unassigns the ticket.
    pub technician: Option<String>,
    pub estimated_cost: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateTicketRequest {
    pub fn into_update(self) -> Result<TicketUpdate, ValidationError> {
        if let Some(cost) = self.estimated_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(ValidationError::invalid(
                    "estimatedCost",
                    "must be a non-negative number",
                ));
            }
        }

        Ok(TicketUpdate {
            status: self.status,
            technician: self.technician,
            estimated_cost: self.estimated_cost,
            notes: self.notes,
        })
    }
}

/// Body of `POST /tickets/{id}/messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageRequest {
    pub text: Option<String>,
}

impl AddMessageRequest {
    pub fn text(&self) -> Result<&str, ValidationError> {
        required("text", &self.text)
    }
}

/// Query string accepted by the ticket listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListParams {
    pub search: Option<String>,
    /// A status value or `All`
    pub status: Option<String>,
    /// `newest`, `oldest` or `priority`
    pub sort: Option<String>,
}

impl TicketListParams {
    pub fn into_query(self) -> Result<TicketQuery, ValidationError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => StatusFilter::All,
            Some(raw) => raw
                .parse::<StatusFilter>()
                .map_err(|e| ValidationError::invalid("status", e))?,
        };
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<SortKey>()
                    .map_err(|e| ValidationError::invalid("sort", e))?,
            ),
        };

        let query = TicketQuery::new()
            .with_search(self.search.unwrap_or_default())
            .with_status(status);
        Ok(match sort {
            Some(key) => query.with_sort(key),
            None => query,
        })
    }
}
