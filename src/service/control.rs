//! Command dispatcher: turns client control intents into bridge commands.
//!
//! [`ControlService`] correlates asynchronous bridge responses with
//! dispatched commands, evicts commands that never get answered, and
//! falls back to the out-of-band request path while the transport is
//! down. Optimistic acceptance and eventual confirmation are kept as two
//! distinct signals: [`ControlOutcome::Accepted`] only means the frame
//! was handed to the bridge; the real resolution arrives later as a
//! `controlResponse` event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::fallback::FallbackPath;
use crate::domain::{BridgeEvent, CorrelationId, DeviceId, EventBus, LightCommand, Topic};
use crate::transport::{OutboundFrame, TransportChannel};

/// Outcome returned to the caller of [`ControlService::send_control`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ControlOutcome {
    /// The command frame was handed to the bridge. Final success or
    /// failure arrives later as a `controlResponse` event carrying the
    /// same correlation ID.
    #[serde(rename_all = "camelCase")]
    Accepted {
        /// Token the eventual response will carry.
        correlation_id: CorrelationId,
    },
    /// The command was served synchronously by the fallback path; this
    /// is its final result.
    #[serde(rename_all = "camelCase")]
    Completed {
        /// Whether the command took effect.
        success: bool,
        /// Failure detail when `success` is false.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// A dispatched command still waiting for its bridge response.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    /// Token linking the eventual response.
    pub correlation_id: CorrelationId,
    /// Target light.
    pub device_id: DeviceId,
    /// Dispatched verb.
    pub command: LightCommand,
    /// Dispatched params.
    pub params: Option<Value>,
    /// Dispatch instant; used for timeout bookkeeping.
    pub issued_at: DateTime<Utc>,
}

type PendingMap = Arc<Mutex<HashMap<CorrelationId, PendingCommand>>>;

/// Dispatches control commands and correlates their responses.
pub struct ControlService {
    transport: Arc<TransportChannel>,
    bus: EventBus,
    fallback: Arc<dyn FallbackPath>,
    pending: PendingMap,
    command_timeout: Duration,
    /// Set after the first fallback use of a down-episode so clients get
    /// exactly one notice per episode; cleared on reconnect.
    fallback_notified: Arc<AtomicBool>,
}

impl std::fmt::Debug for ControlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlService")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl ControlService {
    /// Creates the dispatcher and registers its bus subscriptions:
    /// one on `controlResponse` to settle pending commands, one on
    /// `connectionStatus` to re-arm the fallback notice after reconnect.
    #[must_use]
    pub fn new(
        transport: Arc<TransportChannel>,
        bus: EventBus,
        fallback: Arc<dyn FallbackPath>,
        command_timeout: Duration,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            transport,
            bus: bus.clone(),
            fallback,
            pending: Arc::new(Mutex::new(HashMap::new())),
            command_timeout,
            fallback_notified: Arc::new(AtomicBool::new(false)),
        });

        let pending = Arc::clone(&service.pending);
        bus.subscribe(Topic::ControlResponse, move |event| {
            if let BridgeEvent::ControlResponse {
                correlation_id,
                success,
                ..
            } = event
                && let Some(settled) = lock_pending(&pending).remove(correlation_id)
            {
                tracing::debug!(
                    correlation = %correlation_id,
                    device = %settled.device_id,
                    success,
                    "command settled"
                );
            }
            Ok(())
        });

        let notified = Arc::clone(&service.fallback_notified);
        bus.subscribe(Topic::ConnectionStatus, move |event| {
            if let BridgeEvent::ConnectionStatus { connected: true } = event {
                notified.store(false, Ordering::Release);
            }
            Ok(())
        });

        service
    }

    /// Sends a control command for one light.
    ///
    /// While connected, the frame goes out over the transport and the
    /// caller gets an optimistic [`ControlOutcome::Accepted`]; otherwise
    /// the fallback path serves the command synchronously and its result
    /// is returned as [`ControlOutcome::Completed`]. Either way a
    /// `controlResponse` event is eventually published, so a command
    /// never silently disappears.
    pub async fn send_control(
        &self,
        device_id: DeviceId,
        command: LightCommand,
        params: Option<Value>,
    ) -> ControlOutcome {
        let correlation_id = CorrelationId::new();
        let frame = OutboundFrame {
            device_id,
            command,
            params: params.clone(),
            correlation_id,
        };

        if self.transport.send(frame) {
            lock_pending(&self.pending).insert(
                correlation_id,
                PendingCommand {
                    correlation_id,
                    device_id,
                    command,
                    params,
                    issued_at: Utc::now(),
                },
            );
            self.spawn_timeout(correlation_id);
            tracing::debug!(correlation = %correlation_id, device = %device_id, %command, "command accepted");
            return ControlOutcome::Accepted { correlation_id };
        }

        self.notify_fallback_once();
        let result = self
            .fallback
            .request(device_id, command, params.as_ref())
            .await;

        let (success, error) = match result {
            Ok(res) => (res.success, res.error),
            Err(e) => (false, Some(e.to_string())),
        };

        // Publish the resolution so bus subscribers observe fallback
        // commands the same way as transport ones.
        self.bus.publish(
            Topic::ControlResponse,
            &BridgeEvent::ControlResponse {
                correlation_id,
                success,
                error: error.clone(),
            },
        );
        ControlOutcome::Completed { success, error }
    }

    /// Number of commands currently awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock_pending(&self.pending).len()
    }

    /// Evicts the command after the timeout unless a response settled it
    /// first. The map removal decides the winner, so a command is
    /// resolved exactly once.
    fn spawn_timeout(&self, correlation_id: CorrelationId) {
        let pending = Arc::clone(&self.pending);
        let bus = self.bus.clone();
        let timeout = self.command_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if lock_pending(&pending).remove(&correlation_id).is_some() {
                tracing::warn!(correlation = %correlation_id, "command timed out");
                bus.publish(
                    Topic::ControlResponse,
                    &BridgeEvent::ControlResponse {
                        correlation_id,
                        success: false,
                        error: Some("timeout".to_string()),
                    },
                );
            }
        });
    }

    fn notify_fallback_once(&self) {
        if !self.fallback_notified.swap(true, Ordering::AcqRel) {
            tracing::info!("bridge unreachable; serving commands via fallback path");
            self.bus.publish(
                Topic::Notification,
                &BridgeEvent::FallbackNotice {
                    message: "bridge unreachable; commands are served via the fallback path"
                        .to_string(),
                },
            );
        }
    }
}

fn lock_pending(
    pending: &Mutex<HashMap<CorrelationId, PendingCommand>>,
) -> std::sync::MutexGuard<'_, HashMap<CorrelationId, PendingCommand>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use async_trait::async_trait;
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::super::fallback::FallbackResult;
    use super::*;
    use crate::error::GatewayError;
    use crate::transport::{BridgeLink, BridgeStream, TransportConfig};

    /// Fallback double recording calls and answering a scripted result.
    struct RecordingFallback {
        calls: Mutex<Vec<DeviceId>>,
        result: FallbackResult,
    }

    impl RecordingFallback {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                result: FallbackResult {
                    success: true,
                    error: None,
                },
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
        }
    }

    #[async_trait]
    impl FallbackPath for RecordingFallback {
        async fn request(
            &self,
            device_id: DeviceId,
            _command: LightCommand,
            _params: Option<&Value>,
        ) -> Result<FallbackResult, GatewayError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(device_id);
            Ok(self.result.clone())
        }
    }

    /// Link with one scripted duplex stream; further dials are refused.
    struct OneShotLink {
        streams: Mutex<VecDeque<Box<dyn BridgeStream>>>,
    }

    #[async_trait]
    impl BridgeLink for OneShotLink {
        async fn dial(&self) -> io::Result<Box<dyn BridgeStream>> {
            self.streams
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
    }

    fn disconnected_transport(bus: &EventBus) -> Arc<TransportChannel> {
        let link = Arc::new(OneShotLink {
            streams: Mutex::new(VecDeque::new()),
        });
        // never connected: driver is not even started
        Arc::new(TransportChannel::new(link, bus.clone(), TransportConfig::default()))
    }

    async fn connected_transport(
        bus: &EventBus,
    ) -> (Arc<TransportChannel>, tokio::io::DuplexStream) {
        let (client, server) = tokio::io::duplex(4096);
        let link = Arc::new(OneShotLink {
            streams: Mutex::new(VecDeque::from([Box::new(client) as Box<dyn BridgeStream>])),
        });
        let channel = Arc::new(TransportChannel::new(
            link,
            bus.clone(),
            TransportConfig::default(),
        ));
        channel.connect();
        for _ in 0..500 {
            if channel.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(channel.is_connected(), "transport never connected");
        (channel, server)
    }

    fn capture_responses(bus: &EventBus) -> Arc<Mutex<Vec<BridgeEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        bus.subscribe(Topic::ControlResponse, move |event| {
            seen_in
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
            Ok(())
        });
        seen
    }

    #[tokio::test]
    async fn disconnected_command_completes_via_fallback() {
        let bus = EventBus::new();
        let fallback = RecordingFallback::succeeding();
        let service = ControlService::new(
            disconnected_transport(&bus),
            bus.clone(),
            Arc::clone(&fallback) as Arc<dyn FallbackPath>,
            Duration::from_secs(5),
        );
        let responses = capture_responses(&bus);

        let outcome = service
            .send_control(DeviceId::new(7), LightCommand::On, None)
            .await;
        let ControlOutcome::Completed { success, error } = outcome else {
            panic!("expected the fallback result");
        };
        assert!(success);
        assert!(error.is_none());
        assert_eq!(fallback.call_count(), 1);

        // the resolution is also observable on the bus
        let seen = responses.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn fallback_notice_fires_once_per_episode() {
        let bus = EventBus::new();
        let fallback = RecordingFallback::succeeding();
        let service = ControlService::new(
            disconnected_transport(&bus),
            bus.clone(),
            Arc::clone(&fallback) as Arc<dyn FallbackPath>,
            Duration::from_secs(5),
        );

        let notices = Arc::new(Mutex::new(0usize));
        let notices_in = Arc::clone(&notices);
        bus.subscribe(Topic::Notification, move |_| {
            *notices_in.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            Ok(())
        });

        for _ in 0..3 {
            let _ = service
                .send_control(DeviceId::new(7), LightCommand::On, None)
                .await;
        }
        assert_eq!(*notices.lock().unwrap_or_else(PoisonError::into_inner), 1);

        // a successful reconnect re-arms the notice
        bus.publish(
            Topic::ConnectionStatus,
            &BridgeEvent::ConnectionStatus { connected: true },
        );
        let _ = service
            .send_control(DeviceId::new(7), LightCommand::Off, None)
            .await;
        assert_eq!(*notices.lock().unwrap_or_else(PoisonError::into_inner), 2);
    }

    #[tokio::test]
    async fn connected_command_is_accepted_and_settled_by_response() {
        let bus = EventBus::new();
        let (transport, server) = connected_transport(&bus).await;
        let fallback = RecordingFallback::succeeding();
        let service = ControlService::new(
            transport,
            bus.clone(),
            Arc::clone(&fallback) as Arc<dyn FallbackPath>,
            Duration::from_secs(5),
        );
        let responses = capture_responses(&bus);

        let outcome = service
            .send_control(DeviceId::new(7), LightCommand::On, None)
            .await;
        let ControlOutcome::Accepted { correlation_id } = outcome else {
            panic!("expected optimistic acceptance");
        };
        assert_eq!(service.pending_count(), 1);
        assert_eq!(fallback.call_count(), 0);

        // the frame reached the bridge side
        let (server_read, _server_write) = tokio::io::split(server);
        let mut lines = BufReader::new(server_read).lines();
        let line = tokio::time::timeout(Duration::from_secs(1), lines.next_line())
            .await
            .ok()
            .and_then(Result::ok)
            .flatten()
            .unwrap_or_default();
        assert!(line.contains(&correlation_id.to_string()));

        // bridge answers; pending settles and subscribers see exactly one
        // successful response
        bus.publish(
            Topic::ControlResponse,
            &BridgeEvent::ControlResponse {
                correlation_id,
                success: true,
                error: None,
            },
        );
        assert_eq!(service.pending_count(), 0);
        let seen = responses.lock().unwrap_or_else(PoisonError::into_inner);
        let successes = seen
            .iter()
            .filter(|e| matches!(e, BridgeEvent::ControlResponse { success: true, .. }))
            .count();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn unanswered_command_times_out_exactly_once() {
        let bus = EventBus::new();
        let (transport, _server) = connected_transport(&bus).await;
        let fallback = RecordingFallback::succeeding();
        let service = ControlService::new(
            transport,
            bus.clone(),
            Arc::clone(&fallback) as Arc<dyn FallbackPath>,
            Duration::from_millis(20),
        );
        let responses = capture_responses(&bus);

        let outcome = service
            .send_control(DeviceId::new(7), LightCommand::On, None)
            .await;
        assert!(matches!(outcome, ControlOutcome::Accepted { .. }));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(service.pending_count(), 0);

        let seen = responses.lock().unwrap_or_else(PoisonError::into_inner);
        let timeouts: Vec<_> = seen
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    BridgeEvent::ControlResponse {
                        success: false,
                        error: Some(msg),
                        ..
                    } if msg == "timeout"
                )
            })
            .collect();
        assert_eq!(timeouts.len(), 1, "timeout must resolve exactly once");
    }

    #[tokio::test]
    async fn response_before_timeout_suppresses_synthetic_failure() {
        let bus = EventBus::new();
        let (transport, _server) = connected_transport(&bus).await;
        let fallback = RecordingFallback::succeeding();
        let service = ControlService::new(
            transport,
            bus.clone(),
            Arc::clone(&fallback) as Arc<dyn FallbackPath>,
            Duration::from_millis(30),
        );
        let responses = capture_responses(&bus);

        let outcome = service
            .send_control(DeviceId::new(7), LightCommand::On, None)
            .await;
        let ControlOutcome::Accepted { correlation_id } = outcome else {
            panic!("expected optimistic acceptance");
        };
        bus.publish(
            Topic::ControlResponse,
            &BridgeEvent::ControlResponse {
                correlation_id,
                success: true,
                error: None,
            },
        );

        tokio::time::sleep(Duration::from_millis(120)).await;
        let seen = responses.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(seen.len(), 1, "no synthetic timeout after a real response");
    }
}
