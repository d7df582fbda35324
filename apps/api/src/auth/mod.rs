//! Request-scoped caller identity.
//!
//! Sessions are issued by the hosted auth provider; this service only verifies
//! the bearer token and looks up the caller's admin flag.
//!
//! `AppState` holds an `Arc<dyn SessionVerifier>`, so tests and alternative
//! providers can swap the verifier without touching handlers.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::state::AppState;

/// Claims the auth provider puts in its access tokens. Only `sub` is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: i64,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Returns the user id carried by a valid token.
    async fn verify(&self, token: &str) -> Result<Uuid, AppError>;
}

/// HS256 verification against the provider's shared secret.
pub struct JwtSessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionVerifier for JwtSessionVerifier {
    async fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => debug!("Rejected expired session token"),
                    kind => debug!("Rejected session token: {kind:?}"),
                }
                AppError::Unauthorized
            })?;
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
}

/// Identity of the current request; `caller` is `None` for anonymous requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    pub caller: Option<Caller>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { caller: None }
    }

    pub fn user(user_id: Uuid, is_admin: bool) -> Self {
        Self {
            caller: Some(Caller { user_id, is_admin }),
        }
    }

    pub fn require_user(&self) -> Result<Caller, AppError> {
        self.caller.ok_or(AppError::Unauthorized)
    }

    pub fn require_admin(&self) -> Result<Caller, AppError> {
        let caller = self.require_user()?;
        if !caller.is_admin {
            return Err(AppError::admin_required());
        }
        Ok(caller)
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Admin flag from `profiles`; a missing profile is a regular user.
pub async fn load_is_admin(pool: &PgPool, user_id: Uuid) -> Result<bool, AppError> {
    let profile: Option<ProfileRow> = sqlx::query_as(
        "SELECT id, email, display_name, is_admin, created_at FROM profiles WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile.is_some_and(|p| p.is_admin))
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(RequestContext::anonymous());
        };
        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        let user_id = state.verifier.verify(token).await?;
        let is_admin = load_is_admin(&state.db, user_id).await?;
        Ok(RequestContext::user(user_id, is_admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-with-enough-length-0123456789";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        aud: &'a str,
        exp: i64,
    }

    fn token(sub: &str, aud: &str, exp: i64) -> String {
        encode(
            &Header::default(),
            &TestClaims { sub, aud, exp },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn test_valid_token_yields_user_id() {
        let user = Uuid::new_v4();
        let verifier = JwtSessionVerifier::new(SECRET, "authenticated");
        let verified = verifier
            .verify(&token(&user.to_string(), "authenticated", in_an_hour()))
            .await
            .unwrap();
        assert_eq!(verified, user);
    }

    #[tokio::test]
    async fn test_expired_or_foreign_tokens_rejected() {
        let user = Uuid::new_v4().to_string();
        let verifier = JwtSessionVerifier::new(SECRET, "authenticated");

        let expired = token(&user, "authenticated", chrono::Utc::now().timestamp() - 3600);
        assert!(matches!(verifier.verify(&expired).await, Err(AppError::Unauthorized)));

        let wrong_audience = token(&user, "service_role", in_an_hour());
        assert!(matches!(verifier.verify(&wrong_audience).await, Err(AppError::Unauthorized)));

        let other = JwtSessionVerifier::new("another-secret-entirely-0123456789", "authenticated");
        let signed_elsewhere = token(&user, "authenticated", in_an_hour());
        assert!(other.verify(&signed_elsewhere).await.is_err());
    }

    #[tokio::test]
    async fn test_non_uuid_subject_rejected() {
        let verifier = JwtSessionVerifier::new(SECRET, "authenticated");
        let result = verifier.verify(&token("user-42", "authenticated", in_an_hour())).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic Zm9v"), None);
    }

    #[test]
    fn test_role_checks() {
        let anon = RequestContext::anonymous();
        assert!(matches!(anon.require_user(), Err(AppError::Unauthorized)));
        assert!(matches!(anon.require_admin(), Err(AppError::Unauthorized)));

        let user = RequestContext::user(Uuid::new_v4(), false);
        assert!(user.require_user().is_ok());
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden(_))));

        let admin = RequestContext::user(Uuid::new_v4(), true);
        assert!(admin.require_admin().unwrap().is_admin);
    }
}
