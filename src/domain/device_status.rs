//! Device status value objects.
//!
//! [`DeviceStatus`] is the per-light record held by the
//! [`super::DeviceStore`]. It is only ever mutated through `statusUpdate`
//! events flowing from the bridge. Clients change a light by issuing a
//! command and waiting for the bridge's own reported state to come back
//! through the same path, which keeps the bridge the single source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DeviceId;

/// Operating mode reported by the bridge for a single light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LightMode {
    /// Light is off.
    Off,
    /// Light is on at full output.
    On,
    /// Light is on at a reduced level (see [`DeviceStatus::level`]).
    Dimmed,
}

/// Snapshot of one light as last reported by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    /// Bridge channel number.
    pub id: DeviceId,

    /// Room assignment, if the bridge knows one. Room management itself
    /// lives in the CRUD layer, not here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<u32>,

    /// Current operating mode.
    pub mode: LightMode,

    /// Dim level 0–255 when `mode` is [`LightMode::Dimmed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// Bridge-side timestamp of this reading. Drives the last-write-wins
    /// merge in the store.
    pub last_updated: DateTime<Utc>,
}

impl DeviceStatus {
    /// Returns `true` if the light is emitting any output.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self.mode, LightMode::On | LightMode::Dimmed)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn status(mode: LightMode) -> DeviceStatus {
        DeviceStatus {
            id: DeviceId::new(1),
            room_id: None,
            mode,
            level: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn dimmed_counts_as_on() {
        assert!(status(LightMode::On).is_on());
        assert!(status(LightMode::Dimmed).is_on());
        assert!(!status(LightMode::Off).is_on());
    }

    #[test]
    fn serializes_camel_case() {
        let s = status(LightMode::On);
        let json = serde_json::to_string(&s).unwrap_or_default();
        assert!(json.contains("lastUpdated"));
        assert!(json.contains("\"on\""));
        // absent optionals are omitted from the wire form
        assert!(!json.contains("roomId"));
    }

    #[test]
    fn deserializes_without_optionals() {
        let json = r#"{"id":7,"mode":"off","lastUpdated":"2026-01-02T03:04:05Z"}"#;
        let s: DeviceStatus = serde_json::from_str(json).ok().unwrap_or_else(|| {
            panic!("deserialization failed");
        });
        assert_eq!(s.id, DeviceId::new(7));
        assert_eq!(s.mode, LightMode::Off);
        assert!(s.room_id.is_none());
    }
}
