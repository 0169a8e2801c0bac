//! DTOs for the device control endpoint.

use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::LightCommand;

/// Request body for `POST /api/v1/devices/{id}/control`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ControlRequest {
    /// Command verb to send.
    pub command: LightCommand,
    /// Verb-specific parameters, e.g. `{"level": 128}` for `dim`.
    #[serde(default)]
    pub params: Option<Value>,
}
