//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DeviceId, LightCommand, Topic};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client pushed event.
    Event,
    /// Server → Client error.
    Error,
}

/// Actions a client can request over WebSocket, parsed from the
/// envelope payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WsAction {
    /// Subscribe to events on the given topics.
    Subscribe {
        /// Topic wire names, e.g. `["statusUpdate", "energyRollup"]`.
        topics: Vec<Topic>,
    },
    /// Unsubscribe from the given topics.
    Unsubscribe {
        /// Topics to stop receiving.
        topics: Vec<Topic>,
    },
    /// Issue a control command for one light.
    Control {
        /// Target light.
        device_id: DeviceId,
        /// Command verb.
        command: LightCommand,
        /// Verb-specific parameters.
        #[serde(default)]
        params: Option<Value>,
    },
    /// Read the projected status of one light, or all of them.
    GetStatus {
        /// Light to read; omit for the full snapshot.
        #[serde(default)]
        device_id: Option<DeviceId>,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_action_parses_topic_wire_names() {
        let payload = r#"{"action":"subscribe","topics":["statusUpdate","energyRollup"]}"#;
        let action: WsAction = serde_json::from_str(payload).ok().unwrap_or_else(|| {
            panic!("action should parse");
        });
        let WsAction::Subscribe { topics } = action else {
            panic!("wrong action variant");
        };
        assert_eq!(topics, vec![Topic::StatusUpdate, Topic::EnergyRollup]);
    }

    #[test]
    fn control_action_parses_with_params() {
        let payload = r#"{"action":"control","device_id":7,"command":"dim","params":{"level":40}}"#;
        let action: WsAction = serde_json::from_str(payload).ok().unwrap_or_else(|| {
            panic!("action should parse");
        });
        let WsAction::Control {
            device_id,
            command,
            params,
        } = action
        else {
            panic!("wrong action variant");
        };
        assert_eq!(device_id, DeviceId::new(7));
        assert_eq!(command, LightCommand::Dim);
        assert!(params.is_some());
    }

    #[test]
    fn get_status_without_device_is_snapshot_request() {
        let payload = r#"{"action":"get_status"}"#;
        let action: WsAction = serde_json::from_str(payload).ok().unwrap_or_else(|| {
            panic!("action should parse");
        });
        assert!(matches!(action, WsAction::GetStatus { device_id: None }));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let payload = r#"{"action":"reboot_bridge"}"#;
        let result: Result<WsAction, _> = serde_json::from_str(payload);
        assert!(result.is_err());
    }

    #[test]
    fn envelope_round_trips() {
        let msg = WsMessage {
            id: "req-1".to_string(),
            msg_type: WsMessageType::Command,
            timestamp: Utc::now(),
            payload: serde_json::json!({"action":"get_status"}),
        };
        let json = serde_json::to_string(&msg).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"type\":\"command\""));
        let back: WsMessage = serde_json::from_str(&json).ok().unwrap_or_else(|| {
            panic!("deserialization failed");
        });
        assert_eq!(back.msg_type, WsMessageType::Command);
    }
}
