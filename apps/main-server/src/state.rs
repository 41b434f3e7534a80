//! Application state.

use std::sync::Arc;

use auth::JwtManager;
use ticket_store::TicketStore;

use crate::config::Config;

/// Shared application state.
pub struct AppState<S: TicketStore> {
    /// Server configuration.
    pub config: Config,
    /// User and ticket store.
    pub store: S,
    /// Issues and verifies bearer credentials.
    pub jwt_manager: JwtManager,
}

impl<S: TicketStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S, jwt_manager: JwtManager) -> Self {
        Self {
            config,
            store,
            jwt_manager,
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config, store and credential manager.
pub fn create_shared_state<S: TicketStore>(
    config: Config,
    store: S,
    jwt_manager: JwtManager,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, jwt_manager))
}
