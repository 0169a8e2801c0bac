//! Energy telemetry value objects.
//!
//! [`EnergySample`] is the raw per-LED reading carried by `energyUpdate`
//! frames; [`EnergyRollup`] is the derived live figure the
//! [`crate::service::EnergyAggregator`] republishes. Rollups are a live
//! cache; historical accuracy comes from the persisted event log, not
//! from this core.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DeviceId;

/// Instantaneous power reading for one light, as sampled by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnergySample {
    /// Light the sample belongs to.
    pub device_id: DeviceId,
    /// Instantaneous power draw in watts.
    pub power_w: f64,
}

/// Derived live energy figure for one light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRollup {
    /// Light the rollup describes.
    pub device_id: DeviceId,
    /// Most recent instantaneous power draw in watts.
    pub power_w: f64,
    /// Accumulated energy use since the start of the current UTC day,
    /// in watt-hours. Additively integrated, never re-derived.
    pub energy_today_wh: f64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn sample_serializes_camel_case() {
        let sample = EnergySample {
            device_id: DeviceId::new(3),
            power_w: 7.5,
        };
        let json = serde_json::to_string(&sample).unwrap_or_default();
        assert!(json.contains("deviceId"));
        assert!(json.contains("powerW"));
    }

    #[test]
    fn rollup_round_trip() {
        let rollup = EnergyRollup {
            device_id: DeviceId::new(3),
            power_w: 7.5,
            energy_today_wh: 12.25,
        };
        let json = serde_json::to_string(&rollup).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        let back: EnergyRollup = serde_json::from_str(&json).ok().unwrap_or_else(|| {
            panic!("deserialization failed");
        });
        assert_eq!(back, rollup);
    }
}
