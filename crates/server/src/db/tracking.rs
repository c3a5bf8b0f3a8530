//! Tracking log repository: append-only order status history.
//!
//! Events are never mutated or deleted, and `order_id` is deliberately not a
//! foreign key - the log accepts identifiers this service never saw as
//! orders, and history reads return an empty list rather than an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;

/// One appended tracking event.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Primary key.
    pub id: Uuid,
    /// Order the event belongs to (unchecked).
    pub order_id: String,
    /// Status label at this point in the timeline.
    pub status: String,
    /// Where the shipment currently is.
    pub location: String,
    /// Free-form note for the buyer.
    pub message: String,
    /// Server-stamped event time; history is ordered by this, newest first.
    pub updated_at: DateTime<Utc>,
}

/// Fields for appending a tracking event.
#[derive(Debug, Clone)]
pub struct NewTrackingEvent {
    pub order_id: String,
    pub status: String,
    pub location: String,
    pub message: String,
}

/// Repository for tracking-log database operations.
pub struct TrackingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TrackingRepository<'a> {
    /// Create a new tracking repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an event, stamping `updated_at` server-side.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn append(&self, event: &NewTrackingEvent) -> Result<Uuid, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO tracking_events (order_id, status, location, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&event.order_id)
        .bind(&event.status)
        .bind(&event.location)
        .bind(&event.message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Full event history for an order, newest first.
    ///
    /// Returns an empty vector when no events exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, order_id: &str) -> Result<Vec<TrackingEvent>, RepositoryError> {
        let events = sqlx::query_as::<_, TrackingEvent>(
            r"
            SELECT id, order_id, status, location, message, updated_at
            FROM tracking_events
            WHERE order_id = $1
            ORDER BY updated_at DESC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }
}
