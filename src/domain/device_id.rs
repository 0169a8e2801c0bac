//! Type-safe device identifier.
//!
//! [`DeviceId`] is a newtype wrapper around the bridge's numeric channel
//! index so that device identifiers cannot be confused with other integers
//! (room IDs, dim levels, subscription counters).

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a light controlled by the bridge.
///
/// Wraps the channel number assigned by the controller firmware. Devices
/// are discovered dynamically from `statusUpdate` frames, so any `u32` is
/// a potentially valid ID. Used as the dictionary key in
/// [`super::DeviceStore`], command target, and event discriminator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Creates a `DeviceId` from a raw bridge channel number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw channel number.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<DeviceId> for u32 {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_number() {
        let id = DeviceId::new(7);
        assert_eq!(format!("{id}"), "7");
    }

    #[test]
    fn serde_is_transparent() {
        let id = DeviceId::new(42);
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, "42");
        let back: DeviceId = serde_json::from_str(&json).ok().unwrap_or_else(|| {
            panic!("deserialization failed");
        });
        assert_eq!(back, id);
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = DeviceId::new(3);
        let mut map = HashMap::new();
        map.insert(id, "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
