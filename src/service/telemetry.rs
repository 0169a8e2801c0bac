//! Telemetry aggregator: live power and per-day energy rollups.
//!
//! [`EnergyAggregator`] subscribes to raw `energyUpdate` samples and
//! maintains, per light, the latest instantaneous power and an additively
//! integrated energy total for the current UTC day. Derived rollups are
//! republished on the `energyRollup` topic so consumers never need to
//! know the aggregation rule. This is a live cache, not a source of
//! truth; historical accuracy comes from the persisted event log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    BridgeEvent, DeviceId, EnergyRollup, EnergySample, EventBus, SubscriptionId, Topic,
};

/// Longest inter-sample interval credited to the energy integral.
/// Bridge outages would otherwise inflate the daily total.
const MAX_SAMPLE_GAP_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone)]
struct DeviceEnergy {
    power_w: f64,
    energy_today_wh: f64,
    last_sample_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct AggState {
    day: Option<NaiveDate>,
    devices: HashMap<DeviceId, DeviceEnergy>,
}

/// Rolling per-device-per-day energy accumulator.
#[derive(Debug, Default)]
pub struct EnergyAggregator {
    state: Arc<Mutex<AggState>>,
}

impl EnergyAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes the aggregator to `energyUpdate` on `bus`. Each batch
    /// is folded into the state and the derived rollups republished on
    /// `energyRollup` within the same dispatch.
    pub fn attach(&self, bus: &EventBus) -> SubscriptionId {
        let state = Arc::clone(&self.state);
        let bus_out = bus.clone();
        bus.subscribe(Topic::EnergyUpdate, move |event| {
            if let BridgeEvent::EnergyUpdate { timestamp, samples } = event {
                let rollups = fold_samples(&state, *timestamp, samples);
                bus_out.publish(
                    Topic::EnergyRollup,
                    &BridgeEvent::EnergyRollup {
                        timestamp: *timestamp,
                        rollups,
                    },
                );
            }
            Ok(())
        })
    }

    /// Folds one sample batch into the accumulator and returns the
    /// updated rollups for the devices in the batch.
    pub fn apply(&self, timestamp: DateTime<Utc>, samples: &[EnergySample]) -> Vec<EnergyRollup> {
        fold_samples(&self.state, timestamp, samples)
    }

    /// Current rollups for every light seen today, ordered by device ID.
    #[must_use]
    pub fn rollups(&self) -> Vec<EnergyRollup> {
        let state = self.lock_state();
        let mut all: Vec<EnergyRollup> = state
            .devices
            .iter()
            .map(|(id, e)| EnergyRollup {
                device_id: *id,
                power_w: e.power_w,
                energy_today_wh: e.energy_today_wh,
            })
            .collect();
        all.sort_by_key(|r| r.device_id);
        all
    }

    /// Current rollup for one light, if it reported today.
    #[must_use]
    pub fn rollup_for(&self, id: DeviceId) -> Option<EnergyRollup> {
        self.lock_state().devices.get(&id).map(|e| EnergyRollup {
            device_id: id,
            power_w: e.power_w,
            energy_today_wh: e.energy_today_wh,
        })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AggState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The additive integration rule shared by the bus handler and the
/// direct entry point.
///
/// Each sample credits the previous power reading over the elapsed
/// interval (gap-capped), then becomes the new live reading. A sample
/// dated on a new UTC day resets the accumulator first. Rollover is
/// keyed on sample timestamps, not wall clock, so replayed streams
/// aggregate deterministically.
fn fold_samples(
    state: &Mutex<AggState>,
    timestamp: DateTime<Utc>,
    samples: &[EnergySample],
) -> Vec<EnergyRollup> {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

    let day = timestamp.date_naive();
    if state.day != Some(day) {
        if state.day.is_some() {
            tracing::info!(%day, "energy day rollover");
        }
        state.day = Some(day);
        state.devices.clear();
    }

    let mut rollups = Vec::with_capacity(samples.len());
    for sample in samples {
        match state.devices.get_mut(&sample.device_id) {
            Some(entry) => {
                let gap_ms = (timestamp - entry.last_sample_at)
                    .num_milliseconds()
                    .clamp(0, MAX_SAMPLE_GAP_MS);
                let hours = gap_ms as f64 / 3_600_000.0;
                entry.energy_today_wh += entry.power_w * hours;
                entry.power_w = sample.power_w;
                entry.last_sample_at = timestamp;
                rollups.push(EnergyRollup {
                    device_id: sample.device_id,
                    power_w: entry.power_w,
                    energy_today_wh: entry.energy_today_wh,
                });
            }
            None => {
                state.devices.insert(
                    sample.device_id,
                    DeviceEnergy {
                        power_w: sample.power_w,
                        energy_today_wh: 0.0,
                        last_sample_at: timestamp,
                    },
                );
                rollups.push(EnergyRollup {
                    device_id: sample.device_id,
                    power_w: sample.power_w,
                    energy_today_wh: 0.0,
                });
            }
        }
    }
    rollups
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_767_312_000 + secs, 0)
            .single()
            .unwrap_or_default()
    }

    fn sample(id: u32, power_w: f64) -> EnergySample {
        EnergySample {
            device_id: DeviceId::new(id),
            power_w,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_sample_sets_power_without_energy() {
        let agg = EnergyAggregator::new();
        let rollups = agg.apply(at(0), &[sample(1, 10.0)]);
        assert_eq!(rollups.len(), 1);
        let Some(r) = rollups.first() else {
            panic!("rollup missing");
        };
        assert!(close(r.power_w, 10.0));
        assert!(close(r.energy_today_wh, 0.0));
    }

    #[test]
    fn energy_integrates_previous_power_over_interval() {
        let agg = EnergyAggregator::new();
        agg.apply(at(0), &[sample(1, 10.0)]);
        // 30 minutes at 10 W = 5 Wh, regardless of the new reading
        let rollups = agg.apply(at(30 * 60), &[sample(1, 2.0)]);
        let Some(r) = rollups.first() else {
            panic!("rollup missing");
        };
        assert!(close(r.energy_today_wh, 5.0));
        assert!(close(r.power_w, 2.0));

        // additive: another 30 minutes at 2 W adds 1 Wh
        let rollups = agg.apply(at(60 * 60), &[sample(1, 2.0)]);
        let Some(r) = rollups.first() else {
            panic!("rollup missing");
        };
        assert!(close(r.energy_today_wh, 6.0));
    }

    #[test]
    fn interval_is_gap_capped() {
        let agg = EnergyAggregator::new();
        agg.apply(at(0), &[sample(1, 12.0)]);
        // two hours of silence credit only the 5-minute cap
        let rollups = agg.apply(at(2 * 60 * 60), &[sample(1, 12.0)]);
        let Some(r) = rollups.first() else {
            panic!("rollup missing");
        };
        assert!(close(r.energy_today_wh, 1.0)); // 12 W * (5/60) h
    }

    #[test]
    fn duplicate_timestamp_adds_nothing() {
        let agg = EnergyAggregator::new();
        agg.apply(at(0), &[sample(1, 10.0)]);
        agg.apply(at(60), &[sample(1, 10.0)]);
        let before = agg.rollup_for(DeviceId::new(1));
        agg.apply(at(60), &[sample(1, 10.0)]);
        let after = agg.rollup_for(DeviceId::new(1));
        let (Some(before), Some(after)) = (before, after) else {
            panic!("rollup missing");
        };
        assert!(close(before.energy_today_wh, after.energy_today_wh));
    }

    #[test]
    fn day_rollover_resets_totals() {
        let agg = EnergyAggregator::new();
        agg.apply(at(0), &[sample(1, 10.0)]);
        agg.apply(at(60), &[sample(1, 10.0)]);
        let Some(before) = agg.rollup_for(DeviceId::new(1)) else {
            panic!("rollup missing");
        };
        assert!(before.energy_today_wh > 0.0);

        let next_day = at(0) + Duration::days(1);
        let rollups = agg.apply(next_day, &[sample(1, 10.0)]);
        let Some(r) = rollups.first() else {
            panic!("rollup missing");
        };
        assert!(close(r.energy_today_wh, 0.0));
    }

    #[test]
    fn attach_republishes_rollups_on_bus() {
        let bus = EventBus::new();
        let agg = EnergyAggregator::new();
        agg.attach(&bus);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        bus.subscribe(Topic::EnergyRollup, move |event| {
            seen_in
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
            Ok(())
        });

        bus.publish(
            Topic::EnergyUpdate,
            &BridgeEvent::EnergyUpdate {
                timestamp: at(0),
                samples: vec![sample(1, 10.0), sample(2, 3.5)],
            },
        );

        let seen = seen.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(seen.len(), 1);
        let Some(BridgeEvent::EnergyRollup { rollups, .. }) = seen.first() else {
            panic!("expected a rollup event");
        };
        assert_eq!(rollups.len(), 2);
    }

    #[test]
    fn per_device_totals_are_independent() {
        let agg = EnergyAggregator::new();
        agg.apply(at(0), &[sample(1, 10.0), sample(2, 100.0)]);
        agg.apply(at(60 * 60), &[sample(1, 10.0), sample(2, 100.0)]);
        // both gaps capped at 5 minutes
        let (Some(a), Some(b)) = (
            agg.rollup_for(DeviceId::new(1)),
            agg.rollup_for(DeviceId::new(2)),
        ) else {
            panic!("rollup missing");
        };
        assert!(close(a.energy_today_wh, 10.0 / 12.0));
        assert!(close(b.energy_today_wh, 100.0 / 12.0));
    }
}
