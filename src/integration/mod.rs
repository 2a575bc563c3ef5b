//! Integration lifecycle: config flow, entry persistence, setup and unload.
//!
//! # Data Flow
//! ```text
//! User input
//!     → flow.rs (address check, API key probe)
//!     → store.rs (persist entry)
//!     → setup.rs (coordinator + sensor, first refresh, poll loop)
//!
//! Removal:
//!     setup.rs unload → stop loop, detach sensor
//!     → store.rs remove
//! ```

pub mod flow;
pub mod setup;
pub mod store;

/// Namespace for identifiers produced by this integration.
pub const DOMAIN: &str = "geod_balance";

pub use flow::{ConfigFlow, FlowError, FlowResult, UserInput};
pub use setup::{Integration, SetupError, SetupResult};
pub use store::{ConfigEntry, EntryData, EntryStore, StoreError};
