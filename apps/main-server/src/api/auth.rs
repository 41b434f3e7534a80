//! Authentication API endpoints.

use std::sync::Arc;

use api_protocol::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use auth::Principal;
use axum::{Extension, Json, extract::State, http::StatusCode};
use entities::User;
use ticket_store::TicketStore;

use crate::error::{ServerError, ServerResult};
use crate::extract::ValidJson;
use crate::state::AppState;

/// Runs argon2 off the async executor.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> auth::AuthResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("password task failed: {e}")))?
        .map_err(ServerError::from)
}

/// Registers a new account and signs the caller in.
pub async fn register<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<AuthResponse>)> {
    let registration = request.validate()?;

    if state
        .store
        .get_user_by_username(&registration.username)
        .await?
        .is_some()
    {
        return Err(ServerError::Conflict("User already exists".to_string()));
    }

    let password = registration.password;
    let password_hash = blocking(move || auth::hash_password(&password)).await?;

    let user = User::new(
        registration.name,
        registration.username,
        registration.email,
        password_hash,
    )
    .with_role(registration.role);

    // The store has the final say on uniqueness; the lookup above only gives
    // the common case a clearer message.
    let user = state.store.create_user(user).await.map_err(|e| match e {
        ticket_store::TicketStoreError::AlreadyExists { .. } => {
            ServerError::Conflict("User already exists".to_string())
        }
        other => other.into(),
    })?;

    let token = state.jwt_manager.issue(user.id)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, token))))
}

/// Exchanges a username and password for a bearer credential.
pub async fn login<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ServerResult<Json<AuthResponse>> {
    let (username, password) = request
        .credentials()
        .map_err(|_| ServerError::InvalidCredentials)?;
    let password = password.to_string();

    let Some(user) = state.store.get_user_by_username(username).await? else {
        // Same cost as a wrong password so the response time does not reveal
        // which usernames exist.
        blocking(move || Ok(auth::verify_against_dummy(&password))).await?;
        tracing::debug!("Login failed");
        return Err(ServerError::InvalidCredentials);
    };

    let hash = user.password_hash.clone();
    let matches = blocking(move || auth::verify_password(&password, &hash)).await?;
    if !matches {
        tracing::debug!(user_id = %user.id, "Login failed");
        return Err(ServerError::InvalidCredentials);
    }

    let token = state.jwt_manager.issue(user.id)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::new(&user, token)))
}

/// Gets the current authenticated user.
pub async fn get_current_user<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
) -> ServerResult<Json<UserResponse>> {
    let user = state
        .store
        .get_user(principal.id)
        .await?
        .ok_or(ServerError::AuthenticationRequired)?;

    Ok(Json(UserResponse::from(&user)))
}
