//! Control command verbs understood by the bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Command verb sent to the bridge for one light.
///
/// `Dim` expects a `{"level": 0..=255}` params object; `On` and `Off`
/// take no params. Params are carried opaquely (`serde_json::Value`)
/// beside the verb, matching the bridge wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LightCommand {
    /// Switch the light on at full output.
    On,
    /// Switch the light off.
    Off,
    /// Dim the light to the level given in params.
    Dim,
}

impl LightCommand {
    /// Returns the wire form of the verb.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Dim => "dim",
        }
    }
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightCommand {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "dim" => Ok(Self::Dim),
            other => Err(GatewayError::InvalidCommand(other.to_string())),
        }
    }
}
