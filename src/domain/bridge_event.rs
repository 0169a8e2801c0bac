//! Domain events flowing between the bridge transport and all consumers.
//!
//! Every inbound bridge frame decodes into a [`BridgeEvent`] which is
//! published through the [`super::EventBus`]. Connectivity transitions and
//! fallback notices are synthesized locally by the transport channel and
//! the command dispatcher; everything else is wire-driven.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CorrelationId, DeviceStatus, EnergyRollup, EnergySample};

/// Topic a [`BridgeEvent`] is published on.
///
/// Topics are independent streams: delivery order is guaranteed per
/// subscription only. The wire names (used by WebSocket clients when
/// subscribing) are the camelCase serde forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    /// Bridge connectivity transitions.
    ConnectionStatus,
    /// Command resolutions, real or synthetic.
    ControlResponse,
    /// Full device status snapshots from the bridge.
    StatusUpdate,
    /// Raw energy samples from the bridge.
    EnergyUpdate,
    /// Derived per-day energy rollups.
    EnergyRollup,
    /// One-shot operator-facing notices (fallback engaged, ...).
    Notification,
}

impl Topic {
    /// All topics a WebSocket client may subscribe to.
    pub const ALL: [Self; 6] = [
        Self::ConnectionStatus,
        Self::ControlResponse,
        Self::StatusUpdate,
        Self::EnergyUpdate,
        Self::EnergyRollup,
        Self::Notification,
    ];

    /// Returns the wire name of the topic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionStatus => "connectionStatus",
            Self::ControlResponse => "controlResponse",
            Self::StatusUpdate => "statusUpdate",
            Self::EnergyUpdate => "energyUpdate",
            Self::EnergyRollup => "energyRollup",
            Self::Notification => "notification",
        }
    }
}

/// Event emitted on the bus.
///
/// Immutable value object; carries no ownership semantics beyond its
/// payload. Cloned once per delivery path that needs to retain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// Bridge connectivity changed. Edge-triggered: emitted once per
    /// connect and once per connectivity episode, never per retry.
    #[serde(rename_all = "camelCase")]
    ConnectionStatus {
        /// Whether the bridge is now reachable.
        connected: bool,
    },

    /// A command was resolved: by the bridge, by the fallback path, or
    /// synthetically on timeout.
    #[serde(rename_all = "camelCase")]
    ControlResponse {
        /// Token linking back to the dispatched command.
        correlation_id: CorrelationId,
        /// Whether the command took effect.
        success: bool,
        /// Failure detail when `success` is false.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Bridge reported the current status of one or more devices.
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        /// Most recent status per reported device.
        devices: Vec<DeviceStatus>,
    },

    /// Bridge delivered a batch of raw energy samples.
    #[serde(rename_all = "camelCase")]
    EnergyUpdate {
        /// Bridge-side sampling instant.
        timestamp: DateTime<Utc>,
        /// One sample per reporting light.
        samples: Vec<EnergySample>,
    },

    /// Derived rollups republished by the telemetry aggregator.
    #[serde(rename_all = "camelCase")]
    EnergyRollup {
        /// Sampling instant the rollups were derived from.
        timestamp: DateTime<Utc>,
        /// One rollup per light seen today.
        rollups: Vec<EnergyRollup>,
    },

    /// One-time notice that commands are being served by the fallback
    /// path because the bridge is unreachable.
    #[serde(rename_all = "camelCase")]
    FallbackNotice {
        /// Human-readable explanation for UI display.
        message: String,
    },
}

impl BridgeEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ConnectionStatus { .. } => "connectionStatus",
            Self::ControlResponse { .. } => "controlResponse",
            Self::StatusUpdate { .. } => "statusUpdate",
            Self::EnergyUpdate { .. } => "energyUpdate",
            Self::EnergyRollup { .. } => "energyRollup",
            Self::FallbackNotice { .. } => "fallbackNotice",
        }
    }

    /// Returns the topic this event naturally belongs on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::ConnectionStatus { .. } => Topic::ConnectionStatus,
            Self::ControlResponse { .. } => Topic::ControlResponse,
            Self::StatusUpdate { .. } => Topic::StatusUpdate,
            Self::EnergyUpdate { .. } => Topic::EnergyUpdate,
            Self::EnergyRollup { .. } => Topic::EnergyRollup,
            Self::FallbackNotice { .. } => Topic::Notification,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{DeviceId, LightMode};

    #[test]
    fn topic_wire_names() {
        assert_eq!(Topic::ConnectionStatus.as_str(), "connectionStatus");
        let json = serde_json::to_string(&Topic::EnergyRollup).unwrap_or_default();
        assert_eq!(json, "\"energyRollup\"");
    }

    #[test]
    fn topic_parses_from_wire_name() {
        let topic: Topic = serde_json::from_str("\"statusUpdate\"").ok().unwrap_or_else(|| {
            panic!("topic deserialization failed");
        });
        assert_eq!(topic, Topic::StatusUpdate);
    }

    #[test]
    fn control_response_serializes() {
        let event = BridgeEvent::ControlResponse {
            correlation_id: CorrelationId::new(),
            success: false,
            error: Some("timeout".to_string()),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("controlResponse"));
        assert!(json.contains("correlationId"));
        assert!(json.contains("timeout"));
    }

    #[test]
    fn status_update_topic_mapping() {
        let event = BridgeEvent::StatusUpdate {
            devices: vec![DeviceStatus {
                id: DeviceId::new(1),
                room_id: Some(2),
                mode: LightMode::On,
                level: None,
                last_updated: Utc::now(),
            }],
        };
        assert_eq!(event.topic(), Topic::StatusUpdate);
        assert_eq!(event.event_type_str(), "statusUpdate");
    }

    #[test]
    fn fallback_notice_goes_to_notification_topic() {
        let event = BridgeEvent::FallbackNotice {
            message: "bridge unreachable".to_string(),
        };
        assert_eq!(event.topic(), Topic::Notification);
    }
}
