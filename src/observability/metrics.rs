//! Metrics collection and exposition.
//!
//! # Metrics
//! - `confwatch_updates_total` (counter): updates received, by `kind`
//! - `confwatch_stream_errors_total` (counter): terminal stream errors
//! - `confwatch_best_height` (gauge): node best height at subscribe time
//! - `confwatch_state` (gauge): numeric watch state
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::watch::types::WatchState;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_update(kind: &'static str) {
    counter!("confwatch_updates_total", "kind" => kind).increment(1);
}

pub fn record_stream_error() {
    counter!("confwatch_stream_errors_total").increment(1);
}

pub fn record_best_height(height: u32) {
    gauge!("confwatch_best_height").set(f64::from(height));
}

pub fn record_state(state: WatchState) {
    gauge!("confwatch_state").set(f64::from(state.as_index()));
}
