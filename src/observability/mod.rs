//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinators, client, integration produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of interpolated messages
//! - API keys never appear in any field

pub mod logging;
pub mod metrics;
