//! Blockchain explorer integration subsystem.
//!
//! # Data Flow
//! ```text
//! Entry (wallet address, API key)
//!     → client.rs (explorer GET with timeout)
//!     → types.rs (JSON envelope, raw amount → decimal)
//!     → Decimal balance or UpdateFailed
//! ```
//!
//! # Security Constraints
//! - API keys only travel as a request parameter
//! - Never log API keys or request URLs that contain them
//! - Every call has a fixed timeout

pub mod client;
pub mod types;

pub use client::PolygonscanClient;
pub use types::{PolygonscanError, PolygonscanResult, UpdateFailed};
