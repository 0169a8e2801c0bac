//! Canonical in-memory device snapshot.
//!
//! [`DeviceStore`] is the single source of truth for "what the bridge last
//! told us about each light". It is mutated only by its own subscription
//! to `statusUpdate` events, never by direct client writes, so a command
//! only becomes visible once the bridge reports the resulting state back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{BridgeEvent, DeviceId, DeviceStatus, EventBus, SubscriptionId, Topic};

type DeviceMap = Arc<Mutex<HashMap<DeviceId, DeviceStatus>>>;

/// Projection of the bridge's device state, updated from the event bus.
///
/// Devices are discovered dynamically: an update for an unknown ID inserts
/// a new entry. Entries are never discarded implicitly; removal is the
/// explicit [`DeviceStore::remove`] operation driven by the CRUD layer.
///
/// # Concurrency
///
/// The map is guarded by one mutex. The only writer is the bus handler
/// registered in [`DeviceStore::attach`], which the bus invokes
/// non-concurrently per publish; readers take the same lock briefly to
/// copy out snapshots.
#[derive(Debug, Default)]
pub struct DeviceStore {
    devices: DeviceMap,
}

impl DeviceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes the store to `statusUpdate` events on `bus`.
    ///
    /// Returns the subscription handle; the store lives for the whole
    /// process, so the handle is normally never revoked.
    pub fn attach(&self, bus: &EventBus) -> SubscriptionId {
        let devices = Arc::clone(&self.devices);
        bus.subscribe(Topic::StatusUpdate, move |event| {
            if let BridgeEvent::StatusUpdate { devices: reported } = event {
                merge_statuses(&devices, reported);
            }
            Ok(())
        })
    }

    /// Merges a batch of reported statuses into the snapshot.
    ///
    /// Last write wins per device, keyed on `last_updated`: an update
    /// older than the stored entry is discarded, an equal-or-newer one
    /// replaces it. Robust to duplicates and out-of-order batches.
    pub fn apply_status_update(&self, devices: &[DeviceStatus]) {
        merge_statuses(&self.devices, devices);
    }

    /// Returns the last known status of one device.
    #[must_use]
    pub fn current_status(&self, id: DeviceId) -> Option<DeviceStatus> {
        self.lock_devices().get(&id).cloned()
    }

    /// Returns the full snapshot, ordered by device ID.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceStatus> {
        let map = self.lock_devices();
        let mut all: Vec<DeviceStatus> = map.values().cloned().collect();
        all.sort_by_key(|s| s.id);
        all
    }

    /// Explicitly removes a device entry, returning it if present.
    ///
    /// Called by the CRUD surface when a light is deleted from the
    /// installation; the projector itself never drops entries.
    pub fn remove(&self, id: DeviceId) -> Option<DeviceStatus> {
        self.lock_devices().remove(&id)
    }

    /// Number of devices currently known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_devices().len()
    }

    /// Returns `true` if no device has reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_devices().is_empty()
    }

    fn lock_devices(&self) -> std::sync::MutexGuard<'_, HashMap<DeviceId, DeviceStatus>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The last-write-wins merge shared by the bus handler and the direct
/// entry point.
fn merge_statuses(map: &Mutex<HashMap<DeviceId, DeviceStatus>>, devices: &[DeviceStatus]) {
    let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
    for status in devices {
        match map.get(&status.id) {
            Some(current) if current.last_updated > status.last_updated => {
                tracing::debug!(
                    device = %status.id,
                    "discarding superseded status update"
                );
            }
            _ => {
                map.insert(status.id, status.clone());
            }
        }
    }
}
