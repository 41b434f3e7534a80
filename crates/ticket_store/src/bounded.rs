//! Timeout decorator for ticket stores.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use entities::{RepairTicket, TicketMessage, TicketUpdate, TicketWithOwner, User};
use uuid::Uuid;

use crate::{TicketFilter, TicketStore, TicketStoreError, TicketStoreResult};

/// Wraps another store and fails any call that outlives `timeout` with
/// [`TicketStoreError::Unavailable`] instead of hanging the request.
///
/// A timeout drops the inner future but cannot undo work the backend has
/// already committed. A write that lands just before the deadline still
/// reports `Unavailable`, so a client retrying an `append_message` after a
/// 503 may add the same message twice.
#[derive(Debug, Clone)]
pub struct BoundedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> BoundedStore<S> {
    /// Wraps `inner`, bounding every call by `timeout`.
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) async fn bounded<T, F>(&self, op: &'static str, fut: F) -> TicketStoreResult<T>
    where
        F: Future<Output = TicketStoreResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(TicketStoreError::Unavailable(format!(
                    "{op} did not complete within {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl<S: TicketStore> TicketStore for BoundedStore<S> {
    async fn create_user(&self, user: User) -> TicketStoreResult<User> {
        self.bounded("create_user", self.inner.create_user(user)).await
    }

    async fn get_user(&self, id: Uuid) -> TicketStoreResult<Option<User>> {
        self.bounded("get_user", self.inner.get_user(id)).await
    }

    async fn get_user_by_username(&self, username: &str) -> TicketStoreResult<Option<User>> {
        self.bounded("get_user_by_username", self.inner.get_user_by_username(username))
            .await
    }

    async fn list_users(&self) -> TicketStoreResult<Vec<User>> {
        self.bounded("list_users", self.inner.list_users()).await
    }

    async fn create_ticket(&self, ticket: RepairTicket) -> TicketStoreResult<RepairTicket> {
        self.bounded("create_ticket", self.inner.create_ticket(ticket)).await
    }

    async fn get_ticket(&self, id: Uuid) -> TicketStoreResult<Option<RepairTicket>> {
        self.bounded("get_ticket", self.inner.get_ticket(id)).await
    }

    async fn list_tickets(&self, filter: TicketFilter) -> TicketStoreResult<Vec<RepairTicket>> {
        self.bounded("list_tickets", self.inner.list_tickets(filter)).await
    }

    async fn list_tickets_with_owner(
        &self,
        filter: TicketFilter,
    ) -> TicketStoreResult<Vec<TicketWithOwner>> {
        self.bounded(
            "list_tickets_with_owner",
            self.inner.list_tickets_with_owner(filter),
        )
        .await
    }

    async fn append_message(
        &self,
        ticket_id: Uuid,
        message: TicketMessage,
    ) -> TicketStoreResult<RepairTicket> {
        self.bounded("append_message", self.inner.append_message(ticket_id, message))
            .await
    }

    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
    ) -> TicketStoreResult<RepairTicket> {
        self.bounded("update_ticket", self.inner.update_ticket(id, update))
            .await
    }
}
