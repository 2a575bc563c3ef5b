//! GEOD balance sensor entity.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::integration::store::EntryData;
use crate::integration::DOMAIN;
use crate::polling::{BalanceCoordinator, ListenerId, PollState};
use crate::sensor::registry::EntityRegistry;

/// Unit the balance is published in.
pub const UNIT_OF_MEASUREMENT: &str = "GEOD";

pub const MANUFACTURER: &str = "GEOD Balance";

/// Value published by a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Value(Decimal),
    /// No balance was ever fetched.
    Unknown,
}

impl From<Option<Decimal>> for SensorState {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(SensorState::Unknown, SensorState::Value)
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorState::Value(v) => write!(f, "{}", v),
            SensorState::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for SensorState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Device the sensor is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
}

/// Static identity of a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorDescriptor {
    pub unique_id: String,
    pub name: String,
    pub unit_of_measurement: &'static str,
    pub device_info: DeviceInfo,
}

impl SensorDescriptor {
    pub fn for_entry(data: &EntryData) -> Self {
        let name = format!("{}_geod_balance", data.nickname);
        Self {
            unique_id: format!("{}_{}", DOMAIN, data.wallet_address),
            device_info: DeviceInfo {
                identifiers: vec![(DOMAIN.to_string(), data.wallet_address.clone())],
                name: name.clone(),
                manufacturer: MANUFACTURER.to_string(),
            },
            name,
            unit_of_measurement: UNIT_OF_MEASUREMENT,
        }
    }

    /// Project a poll state onto this sensor.
    pub fn snapshot(&self, poll: &PollState) -> SensorSnapshot {
        SensorSnapshot {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            unit_of_measurement: self.unit_of_measurement,
            state: SensorState::from(poll.last_value),
            available: poll.last_update_success(),
            last_error: poll.last_error.clone(),
            last_updated: poll.last_update,
        }
    }
}

/// Published state of a sensor as seen by the entity registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub unique_id: String,
    pub name: String,
    pub unit_of_measurement: &'static str,
    pub state: SensorState,
    pub available: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Read-through view of a coordinator's balance.
pub struct BalanceSensor {
    descriptor: SensorDescriptor,
    coordinator: Arc<BalanceCoordinator>,
    listener: Option<ListenerId>,
}

impl BalanceSensor {
    pub fn new(data: &EntryData, coordinator: Arc<BalanceCoordinator>) -> Self {
        Self {
            descriptor: SensorDescriptor::for_entry(data),
            coordinator,
            listener: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn unique_id(&self) -> &str {
        &self.descriptor.unique_id
    }

    pub fn unit_of_measurement(&self) -> &'static str {
        self.descriptor.unit_of_measurement
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.descriptor.device_info
    }

    pub fn state(&self) -> SensorState {
        SensorState::from(self.coordinator.data())
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.descriptor.snapshot(&self.coordinator.state())
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Publish the current state and follow coordinator updates.
    ///
    /// Returns false without subscribing when the registry already holds a
    /// sensor with this unique id.
    pub fn attach(&mut self, registry: Arc<EntityRegistry>) -> bool {
        if self.listener.is_some() {
            return true;
        }

        if !registry.register(self.snapshot()) {
            return false;
        }

        let descriptor = self.descriptor.clone();
        let id = self.coordinator.add_listener(Arc::new(move |poll: &PollState| {
            registry.update(descriptor.snapshot(poll));
        }));
        self.listener = Some(id);

        tracing::debug!(unique_id = %self.descriptor.unique_id, "Sensor attached");
        true
    }

    /// Stop following coordinator updates.
    pub fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.coordinator.remove_listener(id);
            tracing::debug!(unique_id = %self.descriptor.unique_id, "Sensor detached");
        }
    }
}

impl Drop for BalanceSensor {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for BalanceSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BalanceSensor")
            .field("unique_id", &self.descriptor.unique_id)
            .field("name", &self.descriptor.name)
            .field("state", &self.state())
            .field("attached", &self.is_attached())
            .finish()
    }
}
