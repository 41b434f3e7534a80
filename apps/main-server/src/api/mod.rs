//! API endpoints.

pub mod auth;
pub mod ticket;
pub mod user;

use std::sync::Arc;

use api_protocol::HealthResponse;
use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use ticket_store::TicketStore;

use crate::error::ServerError;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Creates the API router with all endpoints.
///
/// Everything except registration, login and the health check sits behind
/// [`auth_middleware`].
pub fn create_router<S: TicketStore + 'static>(state: Arc<AppState<S>>) -> Router<Arc<AppState<S>>> {
    let protected = Router::new()
        // Profile
        .route("/auth/me", get(auth::get_current_user::<S>))
        // Tickets
        .route(
            "/tickets",
            get(ticket::list_my_tickets::<S>).post(ticket::create_ticket::<S>),
        )
        .route("/tickets/stats", get(ticket::my_ticket_stats::<S>))
        .route("/tickets/all/list", get(ticket::list_all_tickets::<S>))
        .route("/tickets/all/stats", get(ticket::all_ticket_stats::<S>))
        .route(
            "/tickets/{id}",
            get(ticket::get_ticket::<S>).put(ticket::update_ticket::<S>),
        )
        .route("/tickets/{id}/messages", post(ticket::add_message::<S>))
        // Users
        .route("/users", get(user::list_users::<S>))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware::<S>));

    Router::new()
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/health", get(health_check))
        .merge(protected)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn not_found() -> ServerError {
    ServerError::NotFound("Not Found".to_string())
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
