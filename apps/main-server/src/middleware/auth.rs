//! Authentication middleware.

use std::sync::Arc;

use auth::{JwtManager, Principal};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use ticket_store::TicketStore;
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::AppState;

/// Extracts the bearer token from the Authorization header.
fn extract_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

/// Returns the token part of a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verifies a token and returns the user id it was issued for.
fn verify_token(jwt_manager: &JwtManager, token: &str) -> Result<Uuid, ServerError> {
    jwt_manager.verify_subject(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ServerError::AuthenticationRequired
    })
}

/// Authentication middleware.
///
/// Verifies the bearer token, loads the user it names and stores the
/// resulting [`Principal`] in the request extensions. Tokens for users that
/// no longer exist are rejected like any other invalid credential.
pub async fn auth_middleware<S: TicketStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request) else {
        tracing::debug!("No authentication token provided");
        return ServerError::AuthenticationRequired.into_response();
    };

    let user_id = match verify_token(&state.jwt_manager, token) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    let user = match state.store.get_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(user_id = %user_id, "Token names an unknown user");
            return ServerError::AuthenticationRequired.into_response();
        }
        Err(e) => return ServerError::from(e).into_response(),
    };

    request.extensions_mut().insert(Principal::from(&user));
    next.run(request).await
}
