//! GEOD balance sensor library.
//!
//! Tracks the GEOD token balance of configured Polygon wallets through the
//! Polygonscan API and publishes each balance as a sensor.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod integration;
pub mod lifecycle;
pub mod observability;
pub mod polling;
pub mod sensor;

pub use config::AppConfig;
pub use integration::{ConfigFlow, EntryStore, Integration};
pub use lifecycle::Shutdown;
pub use sensor::EntityRegistry;
