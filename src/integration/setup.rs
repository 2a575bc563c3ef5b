//! Entry setup and unload.
//!
//! # Responsibilities
//! - Build one coordinator + sensor pair per entry
//! - Block setup on the first balance fetch
//! - Retry entries that were not ready on the poll interval
//! - Spawn and stop per-entry poll loops

use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::{PolygonscanClient, PolygonscanError};
use crate::config::AppConfig;
use crate::integration::flow::ConfigFlow;
use crate::integration::store::ConfigEntry;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::polling::{BalanceCoordinator, BalanceFetcher, PollState};
use crate::sensor::{BalanceSensor, EntityRegistry};

/// Reasons an entry could not be set up.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("entry {0} is already set up")]
    AlreadyLoaded(String),

    /// The initial fetch failed; the entity is not created.
    #[error("entry {entry_id} not ready: {reason}")]
    NotReady { entry_id: String, reason: String },

    /// Another loaded entry already publishes a sensor with this unique id.
    #[error("entry {entry_id}: sensor {unique_id} already exists")]
    DuplicateUniqueId { entry_id: String, unique_id: String },

    #[error(transparent)]
    Client(#[from] PolygonscanError),
}

pub type SetupResult<T> = Result<T, SetupError>;

/// Runtime data of a loaded entry.
struct LoadedEntry {
    coordinator: Arc<BalanceCoordinator>,
    sensor: BalanceSensor,
    shutdown: Shutdown,
}

/// Marks an entry id as being set up until dropped.
struct PendingSetup<'a> {
    pending: &'a DashSet<String>,
    entry_id: &'a str,
}

impl Drop for PendingSetup<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.entry_id);
    }
}

/// Owns every loaded entry and the shared entity registry.
pub struct Integration {
    client: PolygonscanClient,
    update_interval: Duration,
    registry: Arc<EntityRegistry>,
    loaded: DashMap<String, LoadedEntry>,
    pending: DashSet<String>,
}

impl Integration {
    pub fn new(config: &AppConfig, registry: Arc<EntityRegistry>) -> SetupResult<Self> {
        Ok(Self {
            client: PolygonscanClient::new(&config.polygonscan)?,
            update_interval: Duration::from_secs(config.polling.update_interval_secs),
            registry,
            loaded: DashMap::new(),
            pending: DashSet::new(),
        })
    }

    /// Override the poll interval (seconds granularity is too coarse for tests).
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// A config flow sharing this integration's client.
    pub fn config_flow(&self) -> ConfigFlow {
        ConfigFlow::new(self.client.clone())
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    /// Set up an entry: first fetch, sensor registration, poll loop.
    pub async fn setup_entry(&self, entry: &ConfigEntry) -> SetupResult<()> {
        // `loaded` is filled before the pending mark is dropped, so a
        // concurrent call always sees one of the two.
        if self.loaded.contains_key(&entry.entry_id) || !self.pending.insert(entry.entry_id.clone())
        {
            return Err(SetupError::AlreadyLoaded(entry.entry_id.clone()));
        }
        let _pending = PendingSetup {
            pending: &self.pending,
            entry_id: &entry.entry_id,
        };

        let fetcher = BalanceFetcher::new(
            self.client.clone(),
            entry.data.wallet_address.clone(),
            entry.data.api_key.clone(),
        );
        let coordinator = Arc::new(BalanceCoordinator::new(
            format!("GEOD Balance Data ({})", entry.title),
            Arc::new(fetcher),
            self.update_interval,
        ));

        coordinator
            .first_refresh()
            .await
            .map_err(|e| SetupError::NotReady {
                entry_id: entry.entry_id.clone(),
                reason: e.message,
            })?;

        let mut sensor = BalanceSensor::new(&entry.data, coordinator.clone());
        if !sensor.attach(self.registry.clone()) {
            return Err(SetupError::DuplicateUniqueId {
                entry_id: entry.entry_id.clone(),
                unique_id: sensor.unique_id().to_string(),
            });
        }

        let entry_id = entry.entry_id.clone();
        if let Some(value) = coordinator.data() {
            metrics::record_balance(&entry_id, value);
        }
        coordinator.add_listener(Arc::new(move |poll: &PollState| {
            if let Some(value) = poll.last_value {
                metrics::record_balance(&entry_id, value);
            }
        }));

        let shutdown = Shutdown::new();
        tokio::spawn(coordinator.clone().run(shutdown.subscribe()));

        tracing::info!(
            entry_id = %entry.entry_id,
            sensor = %sensor.name(),
            state = %sensor.state(),
            "Entry set up"
        );

        self.loaded.insert(
            entry.entry_id.clone(),
            LoadedEntry {
                coordinator,
                sensor,
                shutdown,
            },
        );
        metrics::record_active_entries(self.loaded.len());
        Ok(())
    }

    /// Retry setup of an entry that was not ready, once per poll interval,
    /// until it succeeds or shutdown fires. Returns true once the entry is
    /// loaded. Errors other than [`SetupError::NotReady`] end the retries.
    pub async fn retry_setup(
        self: Arc<Self>,
        entry: ConfigEntry,
        mut shutdown: broadcast::Receiver<()>,
    ) -> bool {
        let mut ticker = time::interval_at(
            time::Instant::now() + self.update_interval,
            self.update_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.setup_entry(&entry).await {
                        Ok(()) => return true,
                        Err(SetupError::NotReady { reason, .. }) => {
                            tracing::warn!(
                                entry_id = %entry.entry_id,
                                reason = %reason,
                                retry_in_secs = self.update_interval.as_secs_f64(),
                                "Entry still not ready"
                            );
                        }
                        Err(e) => {
                            tracing::error!(entry_id = %entry.entry_id, error = %e, "Entry setup failed");
                            return false;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!(entry_id = %entry.entry_id, "Setup retry cancelled");
                    return false;
                }
            }
        }
    }

    /// Stop polling and remove the entry's sensor. Returns false if the entry
    /// was not loaded.
    pub fn unload_entry(&self, entry_id: &str) -> bool {
        let Some((_, mut loaded)) = self.loaded.remove(entry_id) else {
            return false;
        };

        loaded.shutdown.trigger();
        loaded.sensor.detach();
        self.registry.remove(loaded.sensor.unique_id());

        tracing::info!(entry_id = %entry_id, "Entry unloaded");
        metrics::record_active_entries(self.loaded.len());
        true
    }

    /// Unload every loaded entry.
    pub fn unload_all(&self) {
        let ids: Vec<String> = self.loaded.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.unload_entry(&id);
        }
    }

    /// Coordinator of a loaded entry.
    pub fn coordinator(&self, entry_id: &str) -> Option<Arc<BalanceCoordinator>> {
        self.loaded.get(entry_id).map(|e| e.coordinator.clone())
    }

    pub fn is_loaded(&self, entry_id: &str) -> bool {
        self.loaded.contains_key(entry_id)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}
