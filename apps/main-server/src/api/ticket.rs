//! Ticket API endpoints.

use std::sync::Arc;

use api_protocol::{
    AddMessageRequest, CreateTicketRequest, TicketListParams, TicketResponse, UpdateTicketRequest,
};
use auth::Principal;
use axum::{Extension, Json, extract::State, http::StatusCode};
use entities::{RepairTicket, Role, TicketMessage};
use ticket_store::{TicketFilter, TicketStats, TicketStore, TicketStoreError};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::state::AppState;

/// Loads a ticket, then checks the caller may see it.
///
/// Existence is checked first; the guard runs before anything about the
/// ticket reaches the response.
async fn load_visible_ticket<S: TicketStore>(
    state: &AppState<S>,
    principal: &Principal,
    id: Uuid,
) -> ServerResult<RepairTicket> {
    let ticket = state
        .store
        .get_ticket(id)
        .await?
        .ok_or_else(|| TicketStoreError::not_found("Ticket", id.to_string()))?;

    principal.require_owner_or_admin(ticket.user)?;
    Ok(ticket)
}

fn respond(ticket: RepairTicket, principal: &Principal) -> TicketResponse {
    TicketResponse::from_ticket(ticket, principal.is_admin())
}

/// Lists the caller's own tickets.
pub async fn list_my_tickets<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidQuery(params): ValidQuery<TicketListParams>,
) -> ServerResult<Json<Vec<TicketResponse>>> {
    let query = params.into_query()?;
    let tickets = state
        .store
        .list_tickets(TicketFilter::new().with_owner(principal.id))
        .await?;

    let tickets = if query.is_noop() {
        tickets
    } else {
        query.apply(&tickets)
    };

    Ok(Json(
        tickets
            .into_iter()
            .map(|t| respond(t, &principal))
            .collect(),
    ))
}

/// Opens a new ticket owned by the caller.
pub async fn create_ticket<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidJson(request): ValidJson<CreateTicketRequest>,
) -> ServerResult<(StatusCode, Json<TicketResponse>)> {
    let ticket = request.into_ticket(principal.id)?;
    let ticket = state.store.create_ticket(ticket).await?;

    tracing::info!(
        ticket_id = %ticket.id,
        user_id = %principal.id,
        device_type = %ticket.device_type,
        priority = %ticket.priority,
        "Ticket created"
    );

    Ok((StatusCode::CREATED, Json(respond(ticket, &principal))))
}

/// Gets a single ticket with its messages.
pub async fn get_ticket<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<Uuid>,
) -> ServerResult<Json<TicketResponse>> {
    let ticket = load_visible_ticket(&state, &principal, id).await?;
    Ok(Json(respond(ticket, &principal)))
}

/// Applies a partial staff update.
///
/// The path and body are only looked at once the caller is known to be an
/// admin, so non-admins get the same 403 whatever they send.
pub async fn update_ticket<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    path: Result<ValidPath<Uuid>, ServerError>,
    body: Result<ValidJson<UpdateTicketRequest>, ServerError>,
) -> ServerResult<Json<TicketResponse>> {
    principal.require_role(Role::Admin)?;
    let ValidPath(id) = path?;
    let ValidJson(request) = body?;

    let update = request.into_update()?;
    let ticket = state.store.update_ticket(id, update.clone()).await?;

    tracing::info!(
        ticket_id = %id,
        user_id = %principal.id,
        status = ?update.status,
        technician_changed = update.technician.is_some(),
        cost_changed = update.estimated_cost.is_some(),
        "Ticket updated"
    );

    Ok(Json(respond(ticket, &principal)))
}

/// Appends a message to a ticket's conversation.
pub async fn add_message<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(request): ValidJson<AddMessageRequest>,
) -> ServerResult<Json<TicketResponse>> {
    load_visible_ticket(&state, &principal, id).await?;

    let text = request.text()?;
    let message = TicketMessage::new(principal.role, text);
    let ticket = state.store.append_message(id, message).await?;

    tracing::info!(
        ticket_id = %id,
        user_id = %principal.id,
        sender = %principal.role,
        "Message added"
    );

    Ok(Json(respond(ticket, &principal)))
}

/// Lists every ticket with its owner populated.
pub async fn list_all_tickets<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    params: Result<ValidQuery<TicketListParams>, ServerError>,
) -> ServerResult<Json<Vec<TicketResponse>>> {
    principal.require_role(Role::Admin)?;
    let ValidQuery(params) = params?;

    let query = params.into_query()?;
    let tickets = state
        .store
        .list_tickets_with_owner(TicketFilter::new())
        .await?;

    let tickets = if query.is_noop() {
        tickets
    } else {
        query.apply(&tickets)
    };

    Ok(Json(
        tickets.into_iter().map(TicketResponse::with_owner).collect(),
    ))
}

/// Dashboard counters over every ticket.
pub async fn all_ticket_stats<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
) -> ServerResult<Json<TicketStats>> {
    principal.require_role(Role::Admin)?;

    let tickets = state.store.list_tickets(TicketFilter::new()).await?;
    Ok(Json(TicketStats::from_tickets(&tickets)))
}

/// Dashboard counters over the caller's own tickets.
pub async fn my_ticket_stats<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
) -> ServerResult<Json<TicketStats>> {
    let tickets = state
        .store
        .list_tickets(TicketFilter::new().with_owner(principal.id))
        .await?;
    Ok(Json(TicketStats::from_tickets(&tickets)))
}
