//! User administration endpoints.

use std::sync::Arc;

use api_protocol::UserResponse;
use auth::Principal;
use axum::{Extension, Json, extract::State};
use entities::Role;
use ticket_store::TicketStore;

use crate::error::ServerResult;
use crate::state::AppState;

/// Lists every account. Password hashes are never included.
pub async fn list_users<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
) -> ServerResult<Json<Vec<UserResponse>>> {
    principal.require_role(Role::Admin)?;

    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}
