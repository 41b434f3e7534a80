//! Server error types.

use api_protocol::{ErrorResponse, ValidationError};
use auth::AuthError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ticket_store::TicketStoreError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("{0}")]
    InvalidRequest(String),

    /// Username or email already taken.
    #[error("{0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid or expired credential.
    #[error("Not authorized, no valid token")]
    AuthenticationRequired,

    /// Login failed. Deliberately generic.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but not allowed.
    #[error("Not authorized")]
    PermissionDenied,

    /// The path exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Backing store unreachable or too slow.
    #[error("Service temporarily unavailable")]
    StoreUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_)
            | ServerError::Conflict(_)
            | ServerError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ServerError::PermissionDenied => StatusCode::FORBIDDEN,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::StoreUnavailable(detail) => {
                tracing::warn!(detail = %detail, "Store unavailable");
                self.to_string()
            }
            ServerError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                if cfg!(debug_assertions) {
                    self.to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        ServerError::InvalidRequest(e.to_string())
    }
}

impl From<TicketStoreError> for ServerError {
    fn from(e: TicketStoreError) -> Self {
        match e {
            TicketStoreError::NotFound { entity_type, .. } => {
                ServerError::NotFound(format!("{entity_type} not found"))
            }
            TicketStoreError::AlreadyExists { entity_type, .. } => {
                ServerError::Conflict(format!("{entity_type} already exists"))
            }
            TicketStoreError::Unavailable(detail) => ServerError::StoreUnavailable(detail),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Forbidden => ServerError::PermissionDenied,
            AuthError::InvalidCredentials => ServerError::InvalidCredentials,
            e if e.is_unauthenticated() => ServerError::AuthenticationRequired,
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::Conflict("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (ServerError::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (ServerError::PermissionDenied, StatusCode::FORBIDDEN),
            (ServerError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServerError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (ServerError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ServerError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status);
        }
    }

    #[test]
    fn test_store_errors_translate() {
        let not_found: ServerError = TicketStoreError::not_found("Ticket", "abc").into();
        assert!(matches!(not_found, ServerError::NotFound(ref m) if m == "Ticket not found"));

        let conflict: ServerError = TicketStoreError::already_exists("User", "alice").into();
        assert!(matches!(conflict, ServerError::Conflict(_)));

        let slow: ServerError = TicketStoreError::Unavailable("timeout".into()).into();
        assert!(matches!(slow, ServerError::StoreUnavailable(_)));

        let corrupt: ServerError = TicketStoreError::Corrupt("bad row".into()).into();
        assert!(matches!(corrupt, ServerError::Internal(_)));
    }

    #[test]
    fn test_auth_errors_translate() {
        assert!(matches!(ServerError::from(AuthError::Forbidden), ServerError::PermissionDenied));
        assert!(matches!(
            ServerError::from(AuthError::TokenExpired),
            ServerError::AuthenticationRequired
        ));
        assert!(matches!(
            ServerError::from(AuthError::InvalidCredentials),
            ServerError::InvalidCredentials
        ));
        assert!(matches!(
            ServerError::from(AuthError::PasswordHash("x".into())),
            ServerError::Internal(_)
        ));
    }
}
