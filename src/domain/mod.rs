//! Domain layer: core types, device store, and event system.
//!
//! This module contains the gateway-side domain model including device
//! identity, status and energy value objects, the topic-keyed event bus,
//! and the device store projecting the bridge's reported state.

pub mod bridge_event;
pub mod command;
pub mod correlation_id;
pub mod device_id;
pub mod device_status;
pub mod device_store;
pub mod energy;
pub mod event_bus;

pub use bridge_event::{BridgeEvent, Topic};
pub use command::LightCommand;
pub use correlation_id::CorrelationId;
pub use device_id::DeviceId;
pub use device_status::{DeviceStatus, LightMode};
pub use device_store::DeviceStore;
pub use energy::{EnergyRollup, EnergySample};
pub use event_bus::{EventBus, HandlerResult, SubscriptionId};
