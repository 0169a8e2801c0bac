//! Bus-to-database forwarder for the durable event log.
//!
//! Bus handlers must not block, so [`EventLogger`] registers cheap
//! forwarding handlers that push events into an unbounded channel and
//! performs the actual database writes on its own worker task. A failed
//! write is logged and dropped; the durable log is best-effort and never
//! back-pressures event delivery.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::{BridgeEvent, EventBus, SubscriptionId, Topic};

/// Topics forwarded to the durable log.
const LOGGED_TOPICS: [Topic; 2] = [Topic::StatusUpdate, Topic::EnergyRollup];

/// Forwards selected bus events to PostgreSQL on a worker task.
#[derive(Debug)]
pub struct EventLogger {
    bus: EventBus,
    subscriptions: Vec<SubscriptionId>,
    worker: JoinHandle<()>,
}

impl EventLogger {
    /// Subscribes to the logged topics and spawns the writer task.
    #[must_use]
    pub fn spawn(bus: &EventBus, persistence: PostgresPersistence) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BridgeEvent>();

        let subscriptions = LOGGED_TOPICS
            .iter()
            .map(|&topic| {
                let tx = tx.clone();
                bus.subscribe(topic, move |event| {
                    tx.send(event.clone())
                        .map_err(|_| "event logger stopped".into())
                })
            })
            .collect();

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let payload = serde_json::to_value(&event).unwrap_or_default();
                if let Err(e) = persistence
                    .save_event(event.event_type_str(), &payload)
                    .await
                {
                    tracing::warn!(
                        event_type = event.event_type_str(),
                        error = %e,
                        "failed to persist event"
                    );
                }
            }
        });

        Self {
            bus: bus.clone(),
            subscriptions,
            worker,
        }
    }

    /// Revokes the bus subscriptions and stops the writer task.
    pub fn shutdown(self) {
        for id in &self.subscriptions {
            self.bus.unsubscribe(*id);
        }
        self.worker.abort();
    }
}
