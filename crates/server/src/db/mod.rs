//! Database operations for the Loomcart `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Principals (email -> role)
//! - `products` - Catalog, owned per seller
//! - `orders` - Order lifecycle records
//! - `tracking_events` - Append-only tracking log
//!
//! Each table gets one repository; repositories are thin structs over the
//! shared pool and every operation is a single statement. Queries are
//! runtime-checked (`sqlx::query`/`query_as`): the compile-time macros need a
//! live database or a prepared cache, and the dynamic catalog filters could
//! not use them anyway.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p loomcart-cli -- migrate
//! ```

pub mod orders;
pub mod products;
pub mod stats;
pub mod tracking;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use tracking::TrackingRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Outcome of an update statement, mirroring the matched/modified split the
/// API reports to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Rows that matched the target filter.
    pub matched: i64,
    /// Rows whose stored value actually changed.
    pub modified: i64,
}

impl UpdateOutcome {
    /// Whether the update changed anything.
    #[must_use]
    pub const fn changed(self) -> bool {
        self.modified > 0
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_outcome_changed() {
        assert!(
            UpdateOutcome {
                matched: 1,
                modified: 1
            }
            .changed()
        );
        assert!(
            !UpdateOutcome {
                matched: 1,
                modified: 0
            }
            .changed()
        );
    }
}
