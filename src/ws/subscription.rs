//! Per-connection topic subscription manager.
//!
//! Each subscribed topic is a real [`EventBus`] subscription whose
//! handler forwards matching events into the connection's unbounded
//! channel, so bus handlers never block on the socket. Dropping the
//! manager revokes every subscription, so a closed connection stops
//! receiving immediately.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::domain::{BridgeEvent, EventBus, SubscriptionId, Topic};

/// Manages the set of topic subscriptions for a single WebSocket
/// connection.
#[derive(Debug)]
pub struct TopicSubscriptions {
    bus: EventBus,
    forward: mpsc::UnboundedSender<(Topic, BridgeEvent)>,
    active: HashMap<Topic, SubscriptionId>,
}

impl TopicSubscriptions {
    /// Creates an empty manager forwarding events into `forward`.
    #[must_use]
    pub fn new(bus: EventBus, forward: mpsc::UnboundedSender<(Topic, BridgeEvent)>) -> Self {
        Self {
            bus,
            forward,
            active: HashMap::new(),
        }
    }

    /// Subscribes to each topic not already subscribed. Idempotent per
    /// topic.
    pub fn subscribe(&mut self, topics: &[Topic]) {
        for &topic in topics {
            if self.active.contains_key(&topic) {
                continue;
            }
            let tx = self.forward.clone();
            let id = self.bus.subscribe(topic, move |event| {
                tx.send((topic, event.clone()))
                    .map_err(|_| "ws connection gone".into())
            });
            self.active.insert(topic, id);
        }
    }

    /// Revokes the subscription for each given topic. Unknown topics are
    /// ignored.
    pub fn unsubscribe(&mut self, topics: &[Topic]) {
        for topic in topics {
            if let Some(id) = self.active.remove(topic) {
                self.bus.unsubscribe(id);
            }
        }
    }

    /// Returns the currently subscribed topics, in wire-name order.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.active.keys().copied().collect();
        topics.sort_by_key(Topic::as_str);
        topics
    }

    /// Number of subscribed topics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.active.len()
    }
}

impl Drop for TopicSubscriptions {
    fn drop(&mut self) {
        for id in self.active.values() {
            self.bus.unsubscribe(*id);
        }
    }
}
