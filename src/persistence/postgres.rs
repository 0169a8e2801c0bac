//! PostgreSQL implementation of the durable event log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::StoredEvent;
use crate::error::GatewayError;

/// PostgreSQL-backed event log using `sqlx::PgPool`.
///
/// Append-only: the gateway core writes events for external consumers
/// (dashboards, reports) and never reads them back for its own state.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event to the log.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, GatewayError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bridge_events (event_type, payload) VALUES ($1, $2) RETURNING id",
        )
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads events after the given timestamp, optionally filtered by
    /// event type.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<Vec<StoredEvent>, GatewayError> {
        let rows = if let Some(kind) = event_type {
            sqlx::query_as::<_, (i64, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, event_type, payload, created_at FROM bridge_events \
                 WHERE created_at > $1 AND event_type = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(kind)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, event_type, payload, created_at FROM bridge_events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, event_type, payload, created_at)| StoredEvent {
                id,
                event_type,
                payload,
                created_at,
            })
            .collect())
    }

    /// Deletes events older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, GatewayError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM bridge_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
