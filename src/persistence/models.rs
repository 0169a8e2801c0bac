//! Database models for the durable event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored event row from the `bridge_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Event type discriminator (e.g. `"statusUpdate"`).
    pub event_type: String,
    /// JSONB payload with the full event.
    pub payload: serde_json::Value,
    /// Server-side insertion timestamp.
    pub created_at: DateTime<Utc>,
}
