//! Metrics collection and exposition.
//!
//! # Metrics
//! - `geod_fetch_total` (counter): balance fetches by outcome
//! - `geod_balance` (gauge): last fetched balance, labelled by entry id
//! - `geod_active_entries` (gauge): entries currently polling
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests call these freely.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_fetch(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("geod_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_balance(entry_id: &str, value: Decimal) {
    gauge!("geod_balance", "entry_id" => entry_id.to_string()).set(value.to_f64().unwrap_or(0.0));
}

pub fn record_active_entries(count: usize) {
    gauge!("geod_active_entries").set(count as f64);
}
