//! Principal route handlers: registration and role management.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};

use loomcart_core::{Email, Role, UserId};

use crate::db::users::User;
use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::middleware::auth::RequireAdmin;
use crate::routes::{InsertResult, UpdateResult};
use crate::state::AppState;

/// Build the principal router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register).get(list))
        .route("/user/{email}/role", get(role_of))
        .route("/users/{id}", patch(set_role))
}

/// Registration request. Only the email is trusted; roles are assigned by
/// admins after the fact.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
}

/// Registration response: either the insert result or the
/// already-registered acknowledgment the storefront expects.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    Exists { message: &'static str },
    Created(InsertResult<UserId>),
}

/// Register a principal with the default buyer role.
///
/// Registering an email that already exists is a no-op acknowledged with
/// `{"message": "user already exists"}`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unusable email and
/// `AppError::Database` if the store fails.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .normalized();

    let repo = UserRepository::new(state.pool());
    if repo.find_by_email(&email).await?.is_some() {
        return Ok(Json(RegisterResponse::Exists {
            message: "user already exists",
        }));
    }

    // A concurrent registration can still win between the check and the
    // insert; the unique index turns that into the same acknowledgment.
    match repo.create(&email, Role::Buyer).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "registered new principal");
            Ok(Json(RegisterResponse::Created(InsertResult::new(user.id))))
        }
        Err(RepositoryError::Conflict(_)) => Ok(Json(RegisterResponse::Exists {
            message: "user already exists",
        })),
        Err(e) => Err(e.into()),
    }
}

/// List all principals.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}

/// Role lookup response.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
}

/// Public role lookup; unknown or unparseable emails report the default
/// buyer role rather than an error.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn role_of(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>, AppError> {
    let Ok(email) = Email::parse(&email) else {
        return Ok(Json(RoleResponse { role: Role::Buyer }));
    };

    let role = UserRepository::new(state.pool())
        .role_of(&email.normalized())
        .await?
        .unwrap_or_default();

    Ok(Json(RoleResponse { role }))
}

/// Role update request.
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// Set a principal's role.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a role outside the enumerated set and
/// `AppError::Database` if the store fails.
pub async fn set_role(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<UpdateResult>, AppError> {
    let role: Role = body
        .role
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let matched = UserRepository::new(state.pool())
        .set_role(UserId::new(id), role)
        .await?;

    let matched = i64::try_from(matched).unwrap_or(i64::MAX);
    Ok(Json(UpdateResult::new(matched, matched)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_response_exists_shape() {
        let body = serde_json::to_value(RegisterResponse::Exists {
            message: "user already exists",
        })
        .unwrap();
        assert_eq!(body["message"], "user already exists");
    }

    #[test]
    fn test_register_response_created_shape() {
        let body =
            serde_json::to_value(RegisterResponse::Created(InsertResult::new(UserId::new(5))))
                .unwrap();
        assert_eq!(body["insertedId"], 5);
        assert_eq!(body["acknowledged"], true);
    }

    #[test]
    fn test_role_response_shape() {
        let body = serde_json::to_value(RoleResponse { role: Role::Buyer }).unwrap();
        assert_eq!(body["role"], "buyer");
    }
}
