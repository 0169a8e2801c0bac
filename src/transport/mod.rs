//! Transport layer: the single connection to the device bridge.
//!
//! [`TransportChannel`] drives connect/reconnect with capped exponential
//! backoff, frames outbound commands, and decodes inbound frames into
//! events published on the bus. The dial itself sits behind the
//! [`BridgeLink`] seam so tests can run against an in-memory duplex.

pub mod channel;
pub mod frame;
pub mod link;

pub use channel::{ConnectionState, TransportChannel, TransportConfig, backoff_delay};
pub use frame::OutboundFrame;
pub use link::{BridgeLink, BridgeStream, TcpLink};
