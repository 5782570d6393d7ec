// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::ClientInfo;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::hub::EventHub;
use dashmap::DashMap;
use std::sync::Arc;

/// All state shared between the accept loop, the connection handlers, and
/// the background tasks of one relay instance. Owned by that instance's
/// lifetime: constructed at startup, dropped at shutdown, never global.
#[derive(Debug)]
pub struct ServerState {
    /// The resolved configuration. Immutable after startup.
    pub config: Config,
    /// The broadcast hub all connections subscribe to.
    pub hub: EventHub,
    /// Registry of live connections, keyed by session id.
    pub clients: DashMap<u64, ClientInfo>,
    /// Server-wide counters.
    pub stats: StatsState,
}

impl ServerState {
    /// Builds the shared state for one relay instance.
    pub fn initialize(config: Config) -> Arc<Self> {
        let hub = EventHub::new(config.channel_capacity);
        Arc::new(Self {
            config,
            hub,
            clients: DashMap::new(),
            stats: StatsState::new(),
        })
    }
}
