// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only
//! once globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, TextEncoder, register_counter, register_counter_vec,
    register_gauge,
};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of clients currently connected to the relay.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("almacen_relay_connected_clients", "Number of currently connected clients.").unwrap();

    // --- Server-wide Counters ---
    /// The total number of connections accepted by the relay since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("almacen_relay_connections_received_total", "Total number of connections received.").unwrap();
    /// The total number of change events rebroadcast, labeled by entity kind.
    pub static ref EVENTS_RELAYED_TOTAL: CounterVec =
        register_counter_vec!("almacen_relay_events_relayed_total", "Total number of change events rebroadcast, labeled by entity.", &["entity"]).unwrap();
    /// The total number of force-logout broadcasts derived from user deactivations.
    pub static ref FORCE_LOGOUTS_TOTAL: Counter =
        register_counter!("almacen_relay_force_logouts_total", "Total number of force-logout broadcasts emitted.").unwrap();
    /// The total number of events a lagging subscriber missed and will never receive.
    pub static ref LAGGED_EVENTS_DROPPED_TOTAL: Counter =
        register_counter!("almacen_relay_lagged_events_dropped_total", "Total number of events dropped because a subscriber lagged past the hub buffer.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
