//! Sensor entities.
//!
//! A sensor is a thin projection of its coordinator's poll state plus static
//! identity (name, unit, unique id, device). Attached sensors push every new
//! state into the entity registry, which the status API reads.

pub mod entity;
pub mod registry;

pub use entity::{BalanceSensor, DeviceInfo, SensorSnapshot, SensorState, UNIT_OF_MEASUREMENT};
pub use registry::EntityRegistry;
