//! Bridge wire codec: newline-delimited JSON frames.
//!
//! Inbound frames map 1:1 to the wire-driven arm of [`BridgeEvent`]
//! (`statusUpdate`, `energyUpdate`, `controlResponse`); outbound frames
//! carry `{deviceId, command, params, correlationId}`. All keys are
//! camelCase, fixed by the controller firmware.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{BridgeEvent, CorrelationId, DeviceId, LightCommand};
use crate::error::GatewayError;

/// Command frame sent to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame {
    /// Target light.
    pub device_id: DeviceId,
    /// Command verb.
    pub command: LightCommand,
    /// Verb-specific parameters, e.g. `{"level": 128}` for `dim`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Token echoed back in the matching `controlResponse` frame.
    pub correlation_id: CorrelationId,
}

/// Serializes an outbound frame to its single-line JSON wire form.
///
/// The trailing newline is added by the writer.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if serialization fails, which only
/// happens on non-string map keys and similar structural impossibilities.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, GatewayError> {
    serde_json::to_string(frame).map_err(|e| GatewayError::Internal(e.to_string()))
}

/// Decodes one inbound line into a [`BridgeEvent`].
///
/// # Errors
///
/// Returns [`GatewayError::DecodeError`] for malformed JSON or for event
/// types the bridge has no business sending (locally-synthesized kinds
/// such as `connectionStatus`). Callers log and drop; a bad frame never
/// takes the channel down.
pub fn decode_frame(line: &str) -> Result<BridgeEvent, GatewayError> {
    let event: BridgeEvent =
        serde_json::from_str(line).map_err(|e| GatewayError::DecodeError(e.to_string()))?;
    match event {
        BridgeEvent::StatusUpdate { .. }
        | BridgeEvent::EnergyUpdate { .. }
        | BridgeEvent::ControlResponse { .. } => Ok(event),
        other => Err(GatewayError::DecodeError(format!(
            "unexpected frame type from bridge: {}",
            other.event_type_str()
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::LightMode;

    #[test]
    fn outbound_frame_uses_wire_keys() {
        let frame = OutboundFrame {
            device_id: DeviceId::new(7),
            command: LightCommand::Dim,
            params: Some(serde_json::json!({"level": 128})),
            correlation_id: CorrelationId::new(),
        };
        let json = encode_frame(&frame).unwrap_or_default();
        assert!(json.contains("\"deviceId\":7"));
        assert!(json.contains("\"command\":\"dim\""));
        assert!(json.contains("correlationId"));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn outbound_frame_omits_absent_params() {
        let frame = OutboundFrame {
            device_id: DeviceId::new(7),
            command: LightCommand::On,
            params: None,
            correlation_id: CorrelationId::new(),
        };
        let json = encode_frame(&frame).unwrap_or_default();
        assert!(!json.contains("params"));
    }

    #[test]
    fn decodes_status_update() {
        let line = r#"{"eventType":"statusUpdate","devices":[{"id":3,"roomId":1,"mode":"dimmed","level":90,"lastUpdated":"2026-01-02T03:04:05Z"}]}"#;
        let event = decode_frame(line).ok().unwrap_or_else(|| {
            panic!("decode failed");
        });
        let BridgeEvent::StatusUpdate { devices } = event else {
            panic!("wrong event kind");
        };
        assert_eq!(devices.len(), 1);
        assert_eq!(devices.first().map(|d| d.mode), Some(LightMode::Dimmed));
    }

    #[test]
    fn decodes_energy_update() {
        let line = r#"{"eventType":"energyUpdate","timestamp":"2026-01-02T03:04:05Z","samples":[{"deviceId":3,"powerW":7.5}]}"#;
        let event = decode_frame(line).ok().unwrap_or_else(|| {
            panic!("decode failed");
        });
        assert!(matches!(event, BridgeEvent::EnergyUpdate { .. }));
    }

    #[test]
    fn decodes_control_response() {
        let id = CorrelationId::new();
        let line = format!(
            r#"{{"eventType":"controlResponse","correlationId":"{id}","success":true}}"#
        );
        let event = decode_frame(&line).ok().unwrap_or_else(|| {
            panic!("decode failed");
        });
        let BridgeEvent::ControlResponse {
            correlation_id,
            success,
            error,
        } = event
        else {
            panic!("wrong event kind");
        };
        assert_eq!(correlation_id, id);
        assert!(success);
        assert!(error.is_none());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let result = decode_frame("{not json");
        assert!(matches!(result, Err(GatewayError::DecodeError(_))));
    }

    #[test]
    fn locally_synthesized_kinds_are_rejected_from_wire() {
        let line = r#"{"eventType":"connectionStatus","connected":true}"#;
        let result = decode_frame(line);
        assert!(matches!(result, Err(GatewayError::DecodeError(_))));
    }
}
