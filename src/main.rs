//! GEOD balance sensor service.
//!
//! # Architecture Overview
//!
//! ```text
//!   add / remove / list                         run
//!   ─────────────────────┐          ┌──────────────────────────────────────────┐
//!                        ▼          │                                          │
//!                 ┌────────────┐    │  ┌────────────┐   ┌──────────────────┐   │
//!   user input ──▶│ ConfigFlow │    │  │ EntryStore │──▶│   Integration    │   │
//!                 └─────┬──────┘    │  └────────────┘   │  setup / unload  │   │
//!                       │           │                   └────────┬─────────┘   │
//!                       ▼           │                            ▼             │
//!                 ┌────────────┐    │        ┌───────────────────────────────┐ │
//!                 │ EntryStore │    │        │ per entry:                    │ │
//!                 └────────────┘    │        │  BalanceCoordinator (1h tick) │ │
//!                                   │        │   → BalanceFetcher → API      │ │
//!                                   │        │   → BalanceSensor listener    │ │
//!                                   │        └──────────────┬────────────────┘ │
//!                                   │                       ▼                  │
//!                                   │              EntityRegistry → status API │
//!                                   └──────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use geod_balance::api;
use geod_balance::config::{self, AppConfig};
use geod_balance::integration::{EntryStore, FlowResult, Integration, SetupError, UserInput};
use geod_balance::lifecycle::{wait_for_shutdown_signal, Shutdown};
use geod_balance::observability::{logging, metrics};
use geod_balance::sensor::EntityRegistry;

#[derive(Parser)]
#[command(name = "geod-balance")]
#[command(about = "Track GEOD token balances of Polygon wallets", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "geod-balance.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every configured wallet and publish sensor states
    Run,
    /// Validate and store a new wallet entry
    Add {
        #[arg(long)]
        wallet_address: String,
        #[arg(long)]
        nickname: String,
        #[arg(long, env = "POLYGONSCAN_API_KEY", hide_env_values = true)]
        api_key: String,
    },
    /// Remove a stored entry
    Remove { entry_id: String },
    /// List stored entries
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = config::load_or_default(&cli.config)?;

    logging::init_logging(&config.observability)?;

    let store = EntryStore::load_from_file(&config.store.path)?;

    match cli.command {
        Commands::Run => run(config, store).await,
        Commands::Add {
            wallet_address,
            nickname,
            api_key,
        } => {
            add_entry(
                &config,
                &store,
                UserInput {
                    wallet_address,
                    nickname,
                    api_key,
                },
            )
            .await
        }
        Commands::Remove { entry_id } => {
            if store.remove(&entry_id).is_none() {
                return Err(format!("no entry with id {}", entry_id).into());
            }
            store.save_to_file()?;
            println!("Removed {}", entry_id);
            Ok(())
        }
        Commands::List => {
            for entry in store.entries() {
                println!(
                    "{}  {}  {}",
                    entry.entry_id, entry.title, entry.data.wallet_address
                );
            }
            Ok(())
        }
    }
}

async fn add_entry(
    config: &AppConfig,
    store: &EntryStore,
    input: UserInput,
) -> Result<(), Box<dyn Error>> {
    let integration = Integration::new(config, Arc::new(EntityRegistry::new()))?;

    match integration.config_flow().step_user(Some(input)).await {
        FlowResult::CreateEntry { title, data } => {
            let entry = store.add(title, data);
            store.save_to_file()?;
            println!("Added {} ({})", entry.entry_id, entry.title);
            Ok(())
        }
        FlowResult::Form { errors, .. } => {
            let codes: Vec<String> = errors
                .iter()
                .map(|(field, err)| format!("{}: {}", field, err.code()))
                .collect();
            Err(format!("entry rejected ({})", codes.join(", ")).into())
        }
    }
}

async fn run(config: AppConfig, store: EntryStore) -> Result<(), Box<dyn Error>> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        entries = store.len(),
        update_interval_secs = config.polling.update_interval_secs,
        "geod-balance starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(EntityRegistry::new());
    let integration = Arc::new(Integration::new(&config, registry.clone())?);
    let shutdown = Shutdown::new();

    let mut retries = Vec::new();
    for entry in store.entries() {
        match integration.setup_entry(&entry).await {
            Ok(()) => {}
            Err(SetupError::NotReady { reason, .. }) => {
                tracing::warn!(
                    entry_id = %entry.entry_id,
                    reason = %reason,
                    retry_in_secs = config.polling.update_interval_secs,
                    "Entry not ready, will retry"
                );
                retries.push(tokio::spawn(
                    integration.clone().retry_setup(entry, shutdown.subscribe()),
                ));
            }
            Err(e) => {
                tracing::error!(entry_id = %entry.entry_id, error = %e, "Entry setup failed");
            }
        }
    }

    let api_task = if config.api.enabled {
        let listener = TcpListener::bind(&config.api.bind_address).await?;
        Some(tokio::spawn(api::serve(
            listener,
            registry.clone(),
            shutdown.subscribe(),
        )))
    } else {
        None
    };

    wait_for_shutdown_signal().await;

    // Stop retries first so none loads an entry after the unload.
    shutdown.trigger();
    for retry in retries {
        retry.await?;
    }
    integration.unload_all();
    if let Some(task) = api_task {
        task.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
