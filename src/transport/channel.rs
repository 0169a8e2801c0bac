//! Connection lifecycle management for the device bridge.
//!
//! [`TransportChannel`] owns the single connection to the bridge: it
//! dials through a [`BridgeLink`], decodes inbound frames onto the
//! [`EventBus`], writes outbound command frames, and drives the reconnect
//! state machine with capped exponential backoff. Retries are unbounded;
//! a permanently unreachable bridge shows up as a persistent
//! [`ConnectionState::Degraded`], never as a process exit.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::frame::{self, OutboundFrame};
use super::link::{BridgeLink, BridgeStream};
use crate::domain::{BridgeEvent, EventBus, Topic};

/// Exponent clamp keeping the backoff shift well inside `u32`.
const MAX_BACKOFF_EXP: u32 = 16;

/// Connection lifecycle states.
///
/// Transitions are totally ordered per channel instance; the only writer
/// is the driver task spawned by [`TransportChannel::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// A dial attempt is in flight.
    Connecting,
    /// Frames are flowing.
    Connected,
    /// Too many consecutive failures; still retrying on the capped
    /// backoff schedule.
    Degraded,
}

/// Tunables for the reconnect policy.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// First-retry delay; doubles per consecutive failure.
    pub backoff_base: Duration,
    /// Upper bound on the retry delay.
    pub backoff_cap: Duration,
    /// Consecutive failures before the channel reports itself degraded.
    pub degraded_threshold: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(30),
            degraded_threshold: 3,
        }
    }
}

/// Computes the reconnect delay for the given consecutive-failure count:
/// `min(base * 2^failures, cap)`.
#[must_use]
pub fn backoff_delay(base: Duration, cap: Duration, failures: u32) -> Duration {
    let factor = 2u32.saturating_pow(failures.min(MAX_BACKOFF_EXP));
    base.saturating_mul(factor).min(cap)
}

/// State shared between the public handle and the driver task.
struct ChannelCore {
    link: Arc<dyn BridgeLink>,
    bus: EventBus,
    config: TransportConfig,
    state: Mutex<ConnectionState>,
    failures: AtomicU32,
    /// Set once the current down-episode has been announced on the bus,
    /// cleared on reconnect. Keeps connectivity events edge-triggered
    /// when the bridge oscillates or a retry loop spins.
    announced_down: AtomicBool,
    writer: Mutex<Option<mpsc::UnboundedSender<OutboundFrame>>>,
}

/// The single owner of the bridge connection.
///
/// All other components observe connectivity through `connectionStatus`
/// events and the read-only accessors; none of them mutate it.
pub struct TransportChannel {
    core: Arc<ChannelCore>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChannel")
            .field("state", &self.state())
            .field("failures", &self.failure_count())
            .finish_non_exhaustive()
    }
}

impl TransportChannel {
    /// Creates a channel in the [`ConnectionState::Disconnected`] state.
    ///
    /// No I/O happens until [`TransportChannel::connect`] is called.
    #[must_use]
    pub fn new(link: Arc<dyn BridgeLink>, bus: EventBus, config: TransportConfig) -> Self {
        Self {
            core: Arc::new(ChannelCore {
                link,
                bus,
                config,
                state: Mutex::new(ConnectionState::Disconnected),
                failures: AtomicU32::new(0),
                announced_down: AtomicBool::new(false),
                writer: Mutex::new(None),
            }),
            driver: Mutex::new(None),
        }
    }

    /// Starts the connect/reconnect driver task.
    ///
    /// Idempotent: calling while a driver is already running is a no-op.
    pub fn connect(&self) {
        let mut driver = self.lock_driver();
        if driver.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let core = Arc::clone(&self.core);
        *driver = Some(tokio::spawn(async move {
            core.drive().await;
        }));
    }

    /// Stops the driver task and drops the connection.
    pub fn disconnect(&self) {
        if let Some(handle) = self.lock_driver().take() {
            handle.abort();
        }
        *self.core.lock_writer() = None;
        self.core.set_state(ConnectionState::Disconnected);
    }

    /// Hands a command frame to the writer.
    ///
    /// Returns `false` immediately, without blocking or queueing, when
    /// the channel is not connected; the caller owns the fallback.
    pub fn send(&self, frame: OutboundFrame) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.core.lock_writer().as_ref() {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Returns `true` while frames can flow.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.core.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consecutive failed connection attempts since the last success.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.core.failures.load(Ordering::Acquire)
    }

    fn lock_driver(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.driver.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_driver().take() {
            handle.abort();
        }
    }
}

impl ChannelCore {
    async fn drive(self: Arc<Self>) {
        loop {
            self.set_state(ConnectionState::Connecting);
            match self.link.dial().await {
                Ok(stream) => {
                    self.failures.store(0, Ordering::Release);
                    let (tx, rx) = mpsc::unbounded_channel();
                    *self.lock_writer() = Some(tx);
                    self.set_state(ConnectionState::Connected);
                    self.announced_down.store(false, Ordering::Release);
                    tracing::info!("bridge connected");
                    self.bus.publish(
                        Topic::ConnectionStatus,
                        &BridgeEvent::ConnectionStatus { connected: true },
                    );

                    self.pump(stream, rx).await;

                    *self.lock_writer() = None;
                    let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                    self.set_state(ConnectionState::Disconnected);
                    tracing::warn!(failures, "bridge connection lost");
                    self.announce_down();
                }
                Err(e) => {
                    let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                    tracing::warn!(error = %e, failures, "bridge connect attempt failed");
                    if failures >= self.config.degraded_threshold {
                        self.set_state(ConnectionState::Degraded);
                        self.announce_down();
                    } else {
                        self.set_state(ConnectionState::Disconnected);
                    }
                }
            }

            let delay = backoff_delay(
                self.config.backoff_base,
                self.config.backoff_cap,
                self.failures.load(Ordering::Acquire),
            );
            tracing::debug!(delay_ms = delay.as_millis() as u64, "scheduling reconnect");
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs the read/write loop for one established connection.
    ///
    /// Returns when the bridge closes the stream, a read/write fails, or
    /// the outbound sender is dropped by [`TransportChannel::disconnect`].
    async fn pump(
        &self,
        stream: Box<dyn BridgeStream>,
        mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    ) {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut lines = BufReader::new(read_half).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(&line),
                        Ok(None) => {
                            tracing::debug!("bridge closed the stream");
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "bridge read failed");
                            break;
                        }
                    }
                }
                maybe_frame = outbound.recv() => {
                    let Some(out) = maybe_frame else { break };
                    match frame::encode_frame(&out) {
                        Ok(mut json) => {
                            json.push('\n');
                            if let Err(e) = write_half.write_all(json.as_bytes()).await {
                                tracing::warn!(error = %e, "bridge write failed");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping unencodable frame");
                        }
                    }
                }
            }
        }
    }

    /// Decodes one inbound line and publishes the event on its topic.
    /// A frame that fails to decode is logged and dropped.
    fn handle_line(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match frame::decode_frame(line) {
            Ok(event) => {
                self.bus.publish(event.topic(), &event);
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed bridge frame");
            }
        }
    }

    /// Publishes `connected:false` at most once per down-episode.
    fn announce_down(&self) {
        if !self.announced_down.swap(true, Ordering::AcqRel) {
            self.bus.publish(
                Topic::ConnectionStatus,
                &BridgeEvent::ConnectionStatus { connected: false },
            );
        }
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn lock_writer(
        &self,
    ) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<OutboundFrame>>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
