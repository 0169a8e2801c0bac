//! Service layer: command dispatch and telemetry aggregation.
//!
//! [`ControlService`] coordinates control commands, delegates delivery to
//! the transport channel or the fallback path, and emits resolutions
//! through the [`crate::domain::EventBus`]. [`EnergyAggregator`] derives
//! live energy rollups from raw samples.

pub mod control;
pub mod fallback;
pub mod telemetry;

pub use control::{ControlOutcome, ControlService, PendingCommand};
pub use fallback::{FallbackPath, FallbackResult, HttpFallback};
pub use telemetry::EnergyAggregator;
