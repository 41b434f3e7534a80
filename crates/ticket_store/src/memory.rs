//! In-memory ticket store implementation for testing.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use entities::{RepairTicket, TicketMessage, TicketUpdate, TicketWithOwner, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{TicketFilter, TicketStore, TicketStoreError, TicketStoreResult};

/// In-memory ticket store for testing purposes.
///
/// Every mutation runs under a single write lock, which makes appends and
/// partial updates atomic per ticket.
#[derive(Debug, Default, Clone)]
pub struct MemoryTicketStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    tickets: Arc<RwLock<HashMap<Uuid, RepairTicket>>>,
}

impl MemoryTicketStore {
    /// Creates a new in-memory ticket store.
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_tickets(
        tickets: &HashMap<Uuid, RepairTicket>,
        filter: &TicketFilter,
    ) -> Vec<RepairTicket> {
        let mut result: Vec<RepairTicket> = tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        // Creation order, matching the SQLite backend's row order.
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        result
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> TicketStoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(TicketStoreError::already_exists("User", user.id.to_string()));
        }
        if let Some(existing) = users
            .values()
            .find(|u| u.username == user.username || u.email == user.email)
        {
            let taken = if existing.username == user.username {
                &user.username
            } else {
                &user.email
            };
            return Err(TicketStoreError::already_exists("User", taken.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> TicketStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> TicketStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> TicketStoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    // =========================================================================
    // Ticket operations
    // =========================================================================

    async fn create_ticket(&self, ticket: RepairTicket) -> TicketStoreResult<RepairTicket> {
        let mut tickets = self.tickets.write().await;
        if tickets.contains_key(&ticket.id) {
            return Err(TicketStoreError::already_exists(
                "Ticket",
                ticket.id.to_string(),
            ));
        }
        tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn get_ticket(&self, id: Uuid) -> TicketStoreResult<Option<RepairTicket>> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(&id).cloned())
    }

    async fn list_tickets(&self, filter: TicketFilter) -> TicketStoreResult<Vec<RepairTicket>> {
        let tickets = self.tickets.read().await;
        Ok(Self::collect_tickets(&tickets, &filter))
    }

    async fn list_tickets_with_owner(
        &self,
        filter: TicketFilter,
    ) -> TicketStoreResult<Vec<TicketWithOwner>> {
        let tickets = self.tickets.read().await;
        let users = self.users.read().await;

        Ok(Self::collect_tickets(&tickets, &filter)
            .into_iter()
            .map(|ticket| {
                let owner = users.get(&ticket.user).map(User::summary);
                TicketWithOwner { ticket, owner }
            })
            .collect())
    }

    async fn append_message(
        &self,
        ticket_id: Uuid,
        message: TicketMessage,
    ) -> TicketStoreResult<RepairTicket> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| TicketStoreError::not_found("Ticket", ticket_id.to_string()))?;
        ticket.messages.push(message);
        Ok(ticket.clone())
    }

    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
    ) -> TicketStoreResult<RepairTicket> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&id)
            .ok_or_else(|| TicketStoreError::not_found("Ticket", id.to_string()))?;
        update.apply_to(ticket);
        Ok(ticket.clone())
    }
}
