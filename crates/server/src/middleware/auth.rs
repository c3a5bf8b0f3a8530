//! Authentication and authorization extractors.
//!
//! `RequireAuth` establishes identity: it pulls the bearer token from the
//! `Authorization` header and has the external verifier confirm it. The
//! role-gated extractors add the one role lookup a protected request costs,
//! then run the [`crate::authz`] policy. Handlers declare their requirement
//! by taking the matching extractor; nothing re-checks roles inline.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     RequireManager(principal): RequireManager,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", principal.email)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use loomcart_core::{Email, Role};

use crate::authz::{RequiredLevel, authorize};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::services::identity::IdentityError;
use crate::state::AppState;

/// A verified principal with its stored role.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Verified identity email, lowercased.
    pub email: Email,
    /// Stored role; unknown principals default to buyer.
    pub role: Role,
}

/// Extractor requiring a verified identity (no role requirement).
pub struct RequireAuth(pub Principal);

/// Extractor requiring manager or admin role.
pub struct RequireManager(pub Principal);

/// Extractor requiring admin role.
pub struct RequireAdmin(pub Principal);

/// Pull the bearer token out of the `Authorization` header.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when the header is absent, unreadable,
/// or not a `Bearer` credential.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_owned()))
}

/// Verify the request's token and load the caller's stored role.
async fn verify_request(parts: &Parts, state: &AppState) -> Result<Principal, AppError> {
    let token = bearer_token(parts)?;

    let identity = state
        .identity()
        .verify_id_token(token)
        .await
        .map_err(|e| match e {
            // Transport failure is ours, not the caller's.
            IdentityError::Http(err) => AppError::Internal(err.to_string()),
            IdentityError::Rejected { .. }
            | IdentityError::MissingEmail
            | IdentityError::InvalidEmail(_) => {
                AppError::Forbidden("Forbidden access".to_owned())
            }
        })?;

    let role = UserRepository::new(state.pool())
        .role_of(&identity.email)
        .await?
        .unwrap_or_default();

    Ok(Principal {
        email: identity.email,
        role,
    })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = verify_request(parts, state).await?;
        authorize(principal.role, RequiredLevel::AuthenticatedSelf)?;
        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = verify_request(parts, state).await?;
        authorize(principal.role, RequiredLevel::ManagerOrAdmin)?;
        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = verify_request(parts, state).await?;
        authorize(principal.role, RequiredLevel::AdminOnly)?;
        Ok(Self(principal))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/orders");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracts_token() {
        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let parts = parts_with_auth(None);
        assert!(matches!(
            bearer_token(&parts),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(
            bearer_token(&parts),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_bearer_token_empty_token() {
        let parts = parts_with_auth(Some("Bearer "));
        assert!(matches!(
            bearer_token(&parts),
            Err(AppError::Unauthorized(_))
        ));
    }
}
