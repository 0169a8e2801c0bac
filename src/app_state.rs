//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{DeviceStore, EventBus};
use crate::service::{ControlService, EnergyAggregator};
use crate::transport::TransportChannel;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Command dispatcher for control requests.
    pub control: Arc<ControlService>,
    /// Projected device snapshot, read by handlers.
    pub store: Arc<DeviceStore>,
    /// Live energy rollups, read by handlers.
    pub energy: Arc<EnergyAggregator>,
    /// Bridge transport, read for connectivity reporting.
    pub transport: Arc<TransportChannel>,
    /// Event bus for WebSocket subscriptions.
    pub bus: EventBus,
}
