//! User JWT authentication extractors.
//!
//! Tokens are validated against the RS256 public key held in `AppState`.
//! The `email` claim is the identity string the domain services match
//! against rosters and trackers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::Caller;
use shared::jwt::{extract_user_id, JwtConfig};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated user information from JWT.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// Authenticated e-mail, normalized.
    pub email: String,
    /// JWT ID (jti) for log correlation.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns user authentication info.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt.validate_access_token(token)?;
        let user_id = extract_user_id(&claims)?;
        let caller = Caller::new(user_id, &claims.email);

        Ok(UserAuth {
            user_id,
            email: caller.email,
            jti: claims.jti,
        })
    }

    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, &self.email)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

        UserAuth::validate(&state.jwt, token).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            e
        })
    }
}

/// Optional user JWT authentication.
///
/// Public form routes accept anonymous callers. A missing or unusable
/// token yields `None` rather than a rejection.
#[derive(Debug, Clone)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

impl OptionalUserAuth {
    pub fn caller(&self) -> Option<Caller> {
        self.0.as_ref().map(UserAuth::caller)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = bearer_token(parts).and_then(|token| match UserAuth::validate(&state.jwt, token) {
            Ok(auth) => Some(auth),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable token on public route");
                None
            }
        });
        Ok(OptionalUserAuth(auth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reads_identity() {
        let jwt = JwtConfig::new_for_testing("secret");
        let user_id = Uuid::new_v4();
        let (token, jti) = jwt.generate_access_token(user_id, "Alice@Example.com").unwrap();

        let auth = UserAuth::validate(&jwt, &token).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.email, "alice@example.com");
        assert_eq!(auth.jti, jti);
        assert_eq!(auth.caller().user_id, user_id);
    }

    #[test]
    fn test_validate_rejects_foreign_signature() {
        let issuer = JwtConfig::new_for_testing("secret");
        let verifier = JwtConfig::new_for_testing("other");
        let (token, _) = issuer.generate_access_token(Uuid::new_v4(), "a@x.com").unwrap();

        assert!(matches!(
            UserAuth::validate(&verifier, &token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_optional_user_auth_none() {
        assert!(OptionalUserAuth(None).caller().is_none());
    }
}
