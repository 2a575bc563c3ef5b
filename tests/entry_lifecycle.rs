//! End-to-end entry setup, polling and unload against a mock explorer.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use geod_balance::integration::{EntryData, EntryStore, Integration, SetupError};
use geod_balance::lifecycle::Shutdown;
use geod_balance::polling::PollPhase;
use geod_balance::sensor::{EntityRegistry, SensorState};
use rust_decimal_macros::dec;

mod common;
use common::WALLET;

const UNIQUE_ID: &str = "geod_balance_0x1234567890abcdef1234567890abcdef12345678";

fn entry_data() -> EntryData {
    EntryData {
        wallet_address: WALLET.to_string(),
        nickname: "main".to_string(),
        api_key: "key".to_string(),
    }
}

#[tokio::test]
async fn test_setup_publishes_initial_value_and_keeps_it_on_failure() {
    let healthy = Arc::new(AtomicBool::new(true));
    let h = healthy.clone();
    let addr = common::start_programmable_backend(move |_| {
        let ok = h.load(Ordering::SeqCst);
        async move {
            if ok {
                (200, common::ok_body("2500000000000000000"))
            } else {
                (500, "dead".to_string())
            }
        }
    })
    .await;

    let registry = Arc::new(EntityRegistry::new());
    let integration = Integration::new(&common::app_config(addr), registry.clone()).unwrap();
    let store = EntryStore::new(None);
    let entry = store.add("main", entry_data());

    integration.setup_entry(&entry).await.unwrap();
    assert!(integration.is_loaded(&entry.entry_id));

    let published = registry.get(UNIQUE_ID).unwrap();
    assert_eq!(published.name, "main_geod_balance");
    assert_eq!(published.unit_of_measurement, "GEOD");
    assert_eq!(published.state, SensorState::Value(dec!(2.5)));
    assert!(published.available);

    let (logs, _guard) = common::capture_logs();
    healthy.store(false, Ordering::SeqCst);
    let coordinator = integration.coordinator(&entry.entry_id).unwrap();
    // Sensor publisher plus the per-entry balance gauge.
    assert_eq!(coordinator.listener_count(), 2);
    assert!(coordinator.refresh().await.is_err());

    let logs = logs.contents();
    assert!(logs.contains("Error fetching GEOD balance"), "{}", logs);
    assert_eq!(logs.lines().filter(|l| l.contains(" ERROR ")).count(), 1, "{}", logs);
    assert!(logs.contains("HTTP 500"), "{}", logs);
    assert!(!logs.contains("apikey"), "{}", logs);

    let published = registry.get(UNIQUE_ID).unwrap();
    assert_eq!(published.state, SensorState::Value(dec!(2.5)));
    assert!(!published.available);
    assert!(published.last_error.unwrap().contains("HTTP 500"));
    assert_eq!(coordinator.state().phase, PollPhase::Failed);
}

#[tokio::test]
async fn test_initial_fetch_failure_fails_setup() {
    let addr = common::start_mock_backend(200, r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#).await;
    let registry = Arc::new(EntityRegistry::new());
    let integration = Integration::new(&common::app_config(addr), registry.clone()).unwrap();
    let entry = EntryStore::new(None).add("main", entry_data());

    let err = integration.setup_entry(&entry).await.unwrap_err();
    assert!(matches!(err, SetupError::NotReady { .. }));
    assert!(err.to_string().contains("NOTOK"));
    assert!(!integration.is_loaded(&entry.entry_id));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_poll_loop_updates_and_unload_stops_it() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let addr = common::start_programmable_backend(move |_| {
        let n = c.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        async move { (200, common::ok_body(&format!("{}000000000000000000", n))) }
    })
    .await;

    let registry = Arc::new(EntityRegistry::new());
    let integration = Integration::new(&common::app_config(addr), registry.clone())
        .unwrap()
        .with_update_interval(Duration::from_millis(200));
    let entry = EntryStore::new(None).add("main", entry_data());

    integration.setup_entry(&entry).await.unwrap();
    assert_eq!(registry.get(UNIQUE_ID).unwrap().state, SensorState::Value(dec!(1)));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let after_ticks = calls.load(Ordering::SeqCst);
    assert!(after_ticks >= 2, "expected periodic polls, got {}", after_ticks);
    match registry.get(UNIQUE_ID).unwrap().state {
        SensorState::Value(v) => assert!(v > dec!(1)),
        SensorState::Unknown => panic!("state should be known"),
    }

    assert!(integration.unload_entry(&entry.entry_id));
    assert!(!integration.unload_entry(&entry.entry_id));
    assert!(registry.get(UNIQUE_ID).is_none());
    assert_eq!(integration.loaded_count(), 0);

    // Allow an in-flight poll to finish, then make sure polling stopped.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let stopped_at = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), stopped_at);
}

#[tokio::test]
async fn test_duplicate_setup_is_rejected() {
    let addr = common::start_mock_backend(200, r#"{"status":"1","message":"OK","result":"0"}"#).await;
    let integration =
        Integration::new(&common::app_config(addr), Arc::new(EntityRegistry::new())).unwrap();
    let entry = EntryStore::new(None).add("main", entry_data());

    integration.setup_entry(&entry).await.unwrap();
    assert!(matches!(
        integration.setup_entry(&entry).await,
        Err(SetupError::AlreadyLoaded(_))
    ));

    integration.unload_all();
    assert_eq!(integration.loaded_count(), 0);
}

#[tokio::test]
async fn test_second_entry_for_same_wallet_is_rejected() {
    let addr = common::start_programmable_backend(|_| async { (200, common::ok_body("1000000000000000000")) }).await;
    let registry = Arc::new(EntityRegistry::new());
    let integration = Integration::new(&common::app_config(addr), registry.clone()).unwrap();
    let store = EntryStore::new(None);
    let alpha = store.add("alpha", EntryData { nickname: "alpha".to_string(), ..entry_data() });
    let beta = store.add("beta", EntryData { nickname: "beta".to_string(), ..entry_data() });

    integration.setup_entry(&alpha).await.unwrap();
    let err = integration.setup_entry(&beta).await.unwrap_err();
    assert!(
        matches!(&err, SetupError::DuplicateUniqueId { unique_id, .. } if unique_id == UNIQUE_ID),
        "got {:?}",
        err
    );
    assert!(!integration.is_loaded(&beta.entry_id));
    assert_eq!(integration.loaded_count(), 1);
    assert_eq!(registry.get(UNIQUE_ID).unwrap().name, "alpha_geod_balance");

    // Unloading the rejected entry must not touch the survivor's sensor.
    assert!(!integration.unload_entry(&beta.entry_id));
    assert_eq!(registry.len(), 1);

    assert!(integration.unload_entry(&alpha.entry_id));
    assert!(registry.is_empty());

    // The wallet's sensor id is free again.
    integration.setup_entry(&beta).await.unwrap();
    assert_eq!(registry.get(UNIQUE_ID).unwrap().name, "beta_geod_balance");
    integration.unload_all();
}

#[tokio::test]
async fn test_not_ready_entry_is_retried_until_loaded() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let addr = common::start_programmable_backend(move |_| {
        let first = c.fetch_add(1, Ordering::SeqCst) == 0;
        async move {
            if first {
                (503, "unavailable".to_string())
            } else {
                (200, common::ok_body("3000000000000000000"))
            }
        }
    })
    .await;

    let registry = Arc::new(EntityRegistry::new());
    let integration = Arc::new(
        Integration::new(&common::app_config(addr), registry.clone())
            .unwrap()
            .with_update_interval(Duration::from_millis(100)),
    );
    let entry = EntryStore::new(None).add("main", entry_data());

    assert!(matches!(
        integration.setup_entry(&entry).await,
        Err(SetupError::NotReady { .. })
    ));

    let shutdown = Shutdown::new();
    let retry = tokio::spawn(integration.clone().retry_setup(entry.clone(), shutdown.subscribe()));
    let loaded = tokio::time::timeout(Duration::from_secs(2), retry)
        .await
        .expect("retry should finish once the explorer recovers")
        .unwrap();

    assert!(loaded);
    assert!(integration.is_loaded(&entry.entry_id));
    assert_eq!(registry.get(UNIQUE_ID).unwrap().state, SensorState::Value(dec!(3)));
    integration.unload_all();
}

#[tokio::test]
async fn test_retry_stops_on_shutdown() {
    let addr = common::start_mock_backend(503, "unavailable").await;
    let integration = Arc::new(
        Integration::new(&common::app_config(addr), Arc::new(EntityRegistry::new()))
            .unwrap()
            .with_update_interval(Duration::from_millis(100)),
    );
    let entry = EntryStore::new(None).add("main", entry_data());

    let shutdown = Shutdown::new();
    let retry = tokio::spawn(integration.clone().retry_setup(entry.clone(), shutdown.subscribe()));
    tokio::time::sleep(Duration::from_millis(250)).await;
    shutdown.trigger();

    let loaded = tokio::time::timeout(Duration::from_secs(2), retry)
        .await
        .expect("retry should stop on shutdown")
        .unwrap();
    assert!(!loaded);
    assert!(!integration.is_loaded(&entry.entry_id));
}

#[tokio::test]
async fn test_concurrent_setup_of_one_entry_loads_once() {
    let addr = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        (200, common::ok_body("1000000000000000000"))
    })
    .await;
    let registry = Arc::new(EntityRegistry::new());
    let integration = Integration::new(&common::app_config(addr), registry.clone()).unwrap();
    let entry = EntryStore::new(None).add("main", entry_data());

    let (first, second) = tokio::join!(integration.setup_entry(&entry), integration.setup_entry(&entry));

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(SetupError::AlreadyLoaded(_))))
            .count(),
        1
    );
    assert_eq!(integration.loaded_count(), 1);
    assert_eq!(registry.len(), 1);

    // A setup that failed the pending check leaves no stale mark behind.
    integration.unload_all();
    integration.setup_entry(&entry).await.unwrap();
    integration.unload_all();
}
