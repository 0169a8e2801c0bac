//! Topic-keyed publish/subscribe registry for domain events.
//!
//! [`EventBus`] maps each [`Topic`] to an ordered set of subscriber
//! handlers. Delivery is synchronous within [`EventBus::publish`]: every
//! live handler is invoked exactly once per published event, in
//! registration order, with no buffering across publishes. Handlers must
//! not block; long-running reactions belong on a worker task fed through
//! a channel.
//!
//! The subscription table is guarded by a single mutex, but handlers run
//! outside it, so a handler may subscribe, unsubscribe, or publish
//! re-entrantly without deadlocking. A per-subscription liveness flag
//! guarantees that a revoked handler never runs again, including for the
//! event currently being dispatched.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{BridgeEvent, Topic};

/// Outcome of a single handler invocation.
///
/// An `Err` is isolated: it is reported to the tracing sink and counted,
/// and delivery continues with the remaining subscribers.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = Arc<dyn Fn(&BridgeEvent) -> HandlerResult + Send + Sync>;

/// Opaque revocation handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct SubEntry {
    id: SubscriptionId,
    /// Cleared by `unsubscribe`; checked immediately before every
    /// invocation so a mid-dispatch revocation takes effect for the
    /// in-flight event too.
    active: Arc<AtomicBool>,
    handler: Handler,
}

struct BusInner {
    next_id: AtomicU64,
    topics: Mutex<HashMap<Topic, Vec<SubEntry>>>,
    handler_errors: AtomicU64,
}

/// Publish/subscribe bus for [`BridgeEvent`]s.
///
/// Cheap to clone; all clones share one subscription table.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "handler_errors",
                &self.inner.handler_errors.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates a new bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(1),
                topics: Mutex::new(HashMap::new()),
                handler_errors: AtomicU64::new(0),
            }),
        }
    }

    /// Registers `handler` for every event published on `topic`.
    ///
    /// Returns the handle used to revoke the subscription. Handlers run
    /// synchronously inside `publish` and must not block.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&BridgeEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = SubEntry {
            id,
            active: Arc::new(AtomicBool::new(true)),
            handler: Arc::new(handler),
        };
        let mut topics = self.lock_topics();
        topics.entry(topic).or_default().push(entry);
        id
    }

    /// Revokes a subscription.
    ///
    /// Idempotent: unknown or already-revoked IDs are ignored. Safe to
    /// call from inside a handler during delivery of the same event; the
    /// revoked handler receives neither the in-flight event (if it has
    /// not run yet) nor any future one.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut topics = self.lock_topics();
        for entries in topics.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                if let Some(entry) = entries.get(pos) {
                    entry.active.store(false, Ordering::Release);
                }
                entries.remove(pos);
                return;
            }
        }
    }

    /// Publishes `event` to every live subscriber of `topic`.
    ///
    /// Returns the number of handlers invoked. Handler errors are logged
    /// and counted but do not stop delivery to the remaining subscribers.
    pub fn publish(&self, topic: Topic, event: &BridgeEvent) -> usize {
        // Snapshot under the lock, invoke outside it: re-entrant
        // subscribe/unsubscribe/publish from a handler must not deadlock.
        let snapshot: Vec<(SubscriptionId, Arc<AtomicBool>, Handler)> = {
            let topics = self.lock_topics();
            topics
                .get(&topic)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|e| (e.id, Arc::clone(&e.active), Arc::clone(&e.handler)))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut delivered = 0;
        for (id, active, handler) in snapshot {
            if !active.load(Ordering::Acquire) {
                continue;
            }
            delivered += 1;
            if let Err(e) = handler(event) {
                self.inner.handler_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    subscription = %id,
                    topic = topic.as_str(),
                    event_type = event.event_type_str(),
                    error = %e,
                    "event handler failed"
                );
            }
        }
        delivered
    }

    /// Returns the number of live subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lock_topics().get(&topic).map_or(0, Vec::len)
    }

    /// Total handler invocations that returned an error since startup.
    #[must_use]
    pub fn handler_error_count(&self) -> u64 {
        self.inner.handler_errors.load(Ordering::Relaxed)
    }

    fn lock_topics(&self) -> std::sync::MutexGuard<'_, HashMap<Topic, Vec<SubEntry>>> {
        self.inner
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
