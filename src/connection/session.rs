// src/connection/session.rs

//! Defines the state associated with a single client session.

/// Per-connection counters, reported in the disconnect log line.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Frames received from this client, well-formed or not.
    pub frames_received: u64,
    /// Change events from this client that were rebroadcast.
    pub events_relayed: u64,
    /// Force-logout broadcasts derived from this client's events.
    pub logouts_emitted: u64,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}
