// src/core/hub.rs

//! The broadcast hub at the center of the relay.
//!
//! Every accepted connection holds one receiver; publishing encodes the frame
//! once and fans the bytes out to all current receivers. There is no
//! per-channel routing on the server side: like the original deployment, the
//! relay emits every event to every connection and leaves channel filtering
//! to the connectors.

use crate::core::RelayError;
use crate::core::protocol::WireFrame;
use bytes::Bytes;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// `EventHub` owns the single broadcast channel connections subscribe to.
/// It is created per server instance, never as process-global state, so a
/// test can spin up an isolated relay with its own hub.
#[derive(Debug)]
pub struct EventHub {
    sender: Sender<Bytes>,
}

impl EventHub {
    /// Creates a hub whose per-subscriber buffer holds `capacity` events.
    /// A receiver that falls further behind than that loses the backlog;
    /// delivery is best-effort by contract.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Registers a new subscriber. The returned receiver observes every
    /// frame published after this call, and nothing published before it.
    pub fn subscribe(&self) -> Receiver<Bytes> {
        self.sender.subscribe()
    }

    /// Publishes a frame to all current subscribers, encoding it exactly
    /// once. Returns the number of subscribers the frame was handed to;
    /// zero when nobody is connected.
    pub fn publish(&self, frame: &WireFrame) -> Result<usize, RelayError> {
        let encoded = frame.encode_to_bytes()?;
        // `send` only fails when there are no receivers, which is not an
        // error for a fire-and-forget broadcast.
        Ok(self.sender.send(encoded).unwrap_or(0))
    }

    /// The number of currently subscribed connections.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
