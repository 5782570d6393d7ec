// src/core/state/client.rs

//! Contains state definitions related to client connections.
//!
//! The registry exists for observability (logs, gauges, the `/metrics`
//! endpoint); nothing is ever routed through it. Broadcast delivery goes
//! through the hub alone, so no per-connection addressing is kept here.

use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug)]
pub struct ClientInfo {
    pub addr: SocketAddr,
    pub session_id: u64,
    pub created: Instant,
    pub last_event_time: Instant,
}

impl ClientInfo {
    pub fn new(addr: SocketAddr, session_id: u64) -> Self {
        let now = Instant::now();
        Self {
            addr,
            session_id,
            created: now,
            last_event_time: now,
        }
    }
}
