//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs run):
//!     Load config → Load entries → Set up each entry → Start status API
//!
//! Shutdown:
//!     signals.rs (SIGTERM/SIGINT) → unload every entry → stop API → exit
//!
//! Per entry:
//!     shutdown.rs Shutdown owned by the entry → stops its poll loop on unload
//! ```
//!
//! # Design Decisions
//! - An entry whose first fetch fails is logged and skipped, not fatal
//! - In-flight fetches are not cancelled; the loop exits after them

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
