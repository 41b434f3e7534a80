//! RepairDesk Server
//!
//! HTTP service for device repair tickets. Customers open tickets, follow
//! their progress and talk to staff; staff triage, update and resolve them.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use auth::JwtManager;
use axum::Router;
use ticket_store::{BoundedStore, SqliteTicketStore, TicketStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::state::{AppState, create_shared_state};

/// Creates the application router with all routes configured.
pub fn create_app<S: TicketStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router(state.clone())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration and store.
pub fn create_state<S: TicketStore>(config: Config, store: S) -> Arc<AppState<S>> {
    let jwt_manager = JwtManager::new(config.jwt_secret.as_bytes());
    create_shared_state(config, store, jwt_manager)
}

/// Opens the configured store, bounded by the configured timeout.
///
/// If the database cannot be opened and fallback is enabled, a disposable
/// in-memory database is used instead. This happens once, at startup.
pub async fn open_store(config: &Config) -> anyhow::Result<BoundedStore<SqliteTicketStore>> {
    let store = match SqliteTicketStore::connect(&config.database_url, config.store_timeout).await
    {
        Ok(store) => store,
        Err(e) if config.store_fallback => {
            tracing::warn!(
                error = %e,
                url = %config.database_url,
                "Primary store unavailable, using in-memory store; data will not persist"
            );
            SqliteTicketStore::open_in_memory().await?
        }
        Err(e) => return Err(e.into()),
    };

    let store = BoundedStore::new(store, config.store_timeout);
    tracing::info!(
        timeout_ms = store.timeout().as_millis() as u64,
        "Ticket store ready"
    );
    Ok(store)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},tower_http=debug")));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
