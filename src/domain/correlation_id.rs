//! Identifier linking an outbound command to its asynchronous response.
//!
//! [`CorrelationId`] is a newtype wrapper around [`uuid::Uuid`] (v4).
//! A fresh ID is generated for every dispatched command and echoed back by
//! the bridge in the matching `controlResponse` frame, so an ID is never
//! reused while a command for it is outstanding.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Correlation token for one command/response exchange with the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    /// Creates a new random `CorrelationId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `CorrelationId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
