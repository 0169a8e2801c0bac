//! # lumen-gateway
//!
//! REST API and WebSocket gateway for a LED lighting controller bridge.
//!
//! The bridge is a single, slow, stateful, occasionally-unreachable
//! device; this crate gives any number of web clients near-real-time
//! visibility into its status and energy telemetry, plus asynchronous
//! control with explicit accepted/confirmed signals. All device
//! authority stays with the bridge — the gateway is a coordination layer.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── ControlService + EnergyAggregator (service/)
//!     ├── EventBus + DeviceStore (domain/)
//!     │
//!     ├── TransportChannel (transport/)  ←→  device bridge
//!     │       └── HttpFallback (service/) when the channel is down
//!     │
//!     └── PostgreSQL event log (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod transport;
pub mod ws;
