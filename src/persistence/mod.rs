//! Persistence layer: durable PostgreSQL event log.
//!
//! The gateway core only writes here: `statusUpdate` and `energyRollup`
//! events are forwarded by [`EventLogger`] for external consumers.
//! Reads stay on the external reporting side; nothing in this crate
//! derives state from the log.

pub mod logger;
pub mod models;
pub mod postgres;

pub use logger::EventLogger;
pub use models::StoredEvent;
pub use postgres::PostgresPersistence;
