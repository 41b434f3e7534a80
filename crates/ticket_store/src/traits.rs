//! Ticket store trait definitions.

use async_trait::async_trait;
use entities::{RepairTicket, TicketMessage, TicketUpdate, TicketWithOwner, User};
use uuid::Uuid;

use crate::TicketStoreResult;

/// Filter options for listing tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Only tickets owned by this user.
    pub owner: Option<Uuid>,
}

impl TicketFilter {
    /// Creates an empty filter matching every ticket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to one owner.
    pub fn with_owner(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Returns true if `ticket` passes the filter.
    pub fn matches(&self, ticket: &RepairTicket) -> bool {
        self.owner.is_none_or(|owner| ticket.user == owner)
    }
}

/// Trait for user and ticket storage operations.
///
/// Implementations must make [`TicketStore::append_message`] an atomic add to
/// the ticket's message sequence and [`TicketStore::update_ticket`] a
/// field-level merge, so concurrent writers never lose each other's changes.
#[async_trait]
pub trait TicketStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user. Fails with `AlreadyExists` if the username or
    /// email is taken.
    async fn create_user(&self, user: User) -> TicketStoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: Uuid) -> TicketStoreResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> TicketStoreResult<Option<User>>;

    /// Lists all users.
    async fn list_users(&self) -> TicketStoreResult<Vec<User>>;

    // =========================================================================
    // Ticket operations
    // =========================================================================

    /// Creates a new ticket.
    async fn create_ticket(&self, ticket: RepairTicket) -> TicketStoreResult<RepairTicket>;

    /// Gets a ticket by ID, including its messages.
    async fn get_ticket(&self, id: Uuid) -> TicketStoreResult<Option<RepairTicket>>;

    /// Lists tickets matching the filter.
    async fn list_tickets(&self, filter: TicketFilter) -> TicketStoreResult<Vec<RepairTicket>>;

    /// Lists tickets matching the filter, each joined with its owner's
    /// public details.
    async fn list_tickets_with_owner(
        &self,
        filter: TicketFilter,
    ) -> TicketStoreResult<Vec<TicketWithOwner>>;

    /// Appends a message to a ticket's log and returns the updated ticket.
    async fn append_message(
        &self,
        ticket_id: Uuid,
        message: TicketMessage,
    ) -> TicketStoreResult<RepairTicket>;

    /// Applies a partial update and returns the updated ticket.
    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
    ) -> TicketStoreResult<RepairTicket>;
}
