//! Balance polling subsystem.
//!
//! # Data Flow
//! ```text
//! Setup:
//!     first_refresh → BalanceSource → state.rs (Settled) → listeners
//!
//! Periodic timer (coordinator.rs):
//!     tick → BalanceSource (fetcher.rs)
//!     → Settled(value) | Failed(reason, value kept)
//!     → listeners notified once per tick
//! ```
//!
//! # Design Decisions
//! - One coordinator per configured entry, one timer per coordinator
//! - State is swapped whole; readers never see a partial update
//! - Failures never stop the loop; the next tick retries

pub mod coordinator;
pub mod fetcher;
pub mod state;

pub use coordinator::{BalanceCoordinator, Listener, ListenerId};
pub use fetcher::{BalanceFetcher, BalanceSource};
pub use state::{PollPhase, PollState};
