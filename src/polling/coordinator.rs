//! Periodic balance polling.
//!
//! # Responsibilities
//! - Fetch the balance once at setup and then on a fixed interval
//! - Keep the last good value across failed polls
//! - Notify registered listeners after every poll

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::UpdateFailed;
use crate::observability::metrics;
use crate::polling::fetcher::BalanceSource;
use crate::polling::state::PollState;

/// Callback invoked with the new state after each poll.
pub type Listener = Arc<dyn Fn(&PollState) + Send + Sync>;

/// Handle returned by [`BalanceCoordinator::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Owns one entry's poll state and drives its balance source.
pub struct BalanceCoordinator {
    name: String,
    source: Arc<dyn BalanceSource>,
    update_interval: Duration,
    state: ArcSwap<PollState>,
    listeners: DashMap<ListenerId, Listener>,
    next_listener: AtomicU64,
}

impl BalanceCoordinator {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn BalanceSource>,
        update_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            update_interval,
            state: ArcSwap::from_pointee(PollState::default()),
            listeners: DashMap::new(),
            next_listener: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<PollState> {
        self.state.load_full()
    }

    /// Last successfully fetched value.
    pub fn data(&self) -> Option<Decimal> {
        self.state.load().last_value
    }

    /// Initial fetch performed before the entity is created.
    pub async fn first_refresh(&self) -> Result<Decimal, UpdateFailed> {
        self.refresh().await.inspect_err(|e| {
            tracing::debug!(
                coordinator = %self.name,
                error = %e,
                "Initial balance refresh failed, entry not ready"
            );
        })
    }

    /// Run one poll and publish the outcome to listeners.
    pub async fn refresh(&self) -> Result<Decimal, UpdateFailed> {
        self.state.store(Arc::new(self.state.load().fetching()));

        let result = self.source.fetch_balance().await;

        let current = self.state.load_full();
        let next = match &result {
            Ok(value) => {
                tracing::debug!(coordinator = %self.name, value = %value, "Balance updated");
                metrics::record_fetch(true);
                current.settled(*value)
            }
            Err(e) => {
                // The source logs the failure with endpoint context.
                tracing::debug!(coordinator = %self.name, error = %e, "Balance update failed");
                metrics::record_fetch(false);
                current.failed(e.message.clone())
            }
        };
        self.state.store(Arc::new(next));
        self.notify_listeners();

        result
    }

    /// Register a callback for state changes.
    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, listener);
        id
    }

    /// Unregister a callback. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify_listeners(&self) {
        // Listeners are copied out so none runs while a map shard is locked.
        let listeners: Vec<Listener> = self.listeners.iter().map(|l| l.value().clone()).collect();
        let state = self.state.load_full();
        for listener in listeners {
            listener(&state);
        }
    }

    /// Poll on the configured interval until shutdown.
    ///
    /// The first tick fires one interval after start; the initial value is
    /// expected to come from [`first_refresh`](Self::first_refresh).
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            coordinator = %self.name,
            interval_secs = self.update_interval.as_secs_f64(),
            "Balance polling starting"
        );

        let mut ticker = time::interval_at(
            time::Instant::now() + self.update_interval,
            self.update_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are recorded in state and logged by the source.
                    let _ = self.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(coordinator = %self.name, "Balance polling stopped");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for BalanceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceCoordinator")
            .field("name", &self.name)
            .field("update_interval", &self.update_interval)
            .field("state", &self.state.load())
            .finish()
    }
}
