//! Principal repository: registration and role management.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use loomcart_core::{Email, Role, UserId};

use super::RepositoryError;

/// A registered principal.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Identity key, stored lowercased.
    pub email: Email,
    /// Access role, defaults to buyer at registration.
    pub role: Role,
    /// When the principal first registered.
    pub created_at: DateTime<Utc>,
}

/// Repository for principal database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a principal by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, role, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Register a new principal with the default buyer role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (email, role)
            VALUES ($1, $2)
            RETURNING id, email, role, created_at
            ",
        )
        .bind(email)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(user)
    }

    /// List all principals, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, role, created_at
            FROM users
            ORDER BY id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Look up a principal's role by email.
    ///
    /// Returns `None` for unknown principals; callers treat that as the
    /// default buyer role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn role_of(&self, email: &Email) -> Result<Option<Role>, RepositoryError> {
        let role = sqlx::query_scalar::<_, Role>(
            r"
            SELECT role
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(role)
    }

    /// Set a principal's role.
    ///
    /// Returns the number of rows matched (0 when the id is unknown).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(&self, id: UserId, role: Role) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET role = $1
            WHERE id = $2
            ",
        )
        .bind(role)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
