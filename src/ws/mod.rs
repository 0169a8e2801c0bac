//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` provides bidirectional communication:
//! clients subscribe to event topics for push updates and may issue
//! control commands over the same connection.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
