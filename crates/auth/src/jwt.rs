//! Bearer credentials: HMAC-signed JWTs that bind a single user id.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, AuthResult, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_JWT_ISSUER};

/// Payload of a RepairDesk credential.
///
/// Only the user id is bound. Role and profile are looked up again on every
/// request, so a role change takes effect without reissuing credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    /// Claims for `user_id`, valid from now for `lifetime`.
    pub fn for_user(user_id: Uuid, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            iss: DEFAULT_JWT_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// The user the credential was issued to.
    pub fn user_id(&self) -> AuthResult<Uuid> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues and verifies credentials with one shared secret.
///
/// There is no revocation list: a credential stays valid until it expires,
/// and signing out is the client discarding it.
#[derive(Clone)]
pub struct JwtManager {
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_hours", &self.lifetime.num_hours())
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a manager issuing 30 day credentials signed with `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::default();
        validation.set_issuer(&[DEFAULT_JWT_ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Self {
            lifetime: Duration::hours(DEFAULT_JWT_EXPIRATION_HOURS as i64),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a fresh credential for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> AuthResult<String> {
        self.sign(&Claims::for_user(user_id, self.lifetime))
    }

    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::JwtEncoding(e.to_string()))
    }

    /// Checks signature, issuer and expiry, and returns the claims.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }

    /// Verifies `token` and returns the user id it names.
    pub fn verify_subject(&self, token: &str) -> AuthResult<Uuid> {
        self.verify(token)?.user_id()
    }
}
