//! Poll state machine.
//!
//! # States
//! - Idle: no fetch attempted yet
//! - Fetching: a fetch is in flight
//! - Settled: last fetch succeeded
//! - Failed: last fetch failed; previous value retained
//!
//! # State Transitions
//! ```text
//! Idle | Settled | Failed → Fetching        (tick)
//! Fetching → Settled(value)                (fetch ok)
//! Fetching → Failed(reason)                (fetch failed)
//! ```
//!
//! There is no terminal state. Every transition produces a new `PollState`
//! value; the coordinator swaps it in whole.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Phase of the most recent poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    #[default]
    Idle,
    Fetching,
    Settled,
    Failed,
}

/// Snapshot of a coordinator's data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollState {
    pub phase: PollPhase,
    /// Last successfully fetched balance.
    pub last_value: Option<Decimal>,
    /// Reason of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    /// When the last fetch completed, successfully or not.
    pub last_update: Option<DateTime<Utc>>,
}

impl PollState {
    pub fn fetching(&self) -> Self {
        Self {
            phase: PollPhase::Fetching,
            ..self.clone()
        }
    }

    pub fn settled(&self, value: Decimal) -> Self {
        Self {
            phase: PollPhase::Settled,
            last_value: Some(value),
            last_error: None,
            last_update: Some(Utc::now()),
        }
    }

    pub fn failed(&self, reason: impl Into<String>) -> Self {
        Self {
            phase: PollPhase::Failed,
            last_value: self.last_value,
            last_error: Some(reason.into()),
            last_update: Some(Utc::now()),
        }
    }

    /// Whether the most recent completed fetch succeeded.
    pub fn last_update_success(&self) -> bool {
        self.last_error.is_none() && self.last_value.is_some()
    }
}
