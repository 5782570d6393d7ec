// src/core/state/stats.rs

//! Contains state definitions and logic for server statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Holds all state and logic related to server-wide statistics and monitoring.
#[derive(Debug)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of change events rebroadcast since startup.
    total_events: AtomicU64,
    /// The total number of force-logout broadcasts emitted since startup.
    total_logouts: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsState {
    /// Creates a new `StatsState` with initialized counters.
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            total_events: AtomicU64::new(0),
            total_logouts: AtomicU64::new(0),
        }
    }

    /// Atomically increments the total number of connections received.
    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of connections received.
    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Atomically increments the total number of events rebroadcast.
    pub fn increment_total_events(&self) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of events rebroadcast.
    pub fn get_total_events(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }

    /// Atomically increments the total number of force logouts emitted.
    pub fn increment_total_logouts(&self) {
        self.total_logouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of force logouts emitted.
    pub fn get_total_logouts(&self) -> u64 {
        self.total_logouts.load(Ordering::Relaxed)
    }
}
