// src/client/dispatcher.rs

//! Per-channel fan-out of inbound relay events to local subscribers.
//!
//! Several UI components in one session may listen on the same channel (a
//! table and a notification badge both watching `user updated`), so each
//! channel name maps to a broadcast sender. Dropping a `Subscription` is the
//! unsubscribe: components subscribe on mount and let the handle fall out of
//! scope on unmount.

use crate::core::protocol::WireFrame;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Routes inbound frames to the subscribers of their channel name.
#[derive(Debug)]
pub struct Dispatcher {
    channels: DashMap<String, broadcast::Sender<Value>>,
    capacity: usize,
}

impl Dispatcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Registers a subscriber for a channel, creating the channel on first
    /// use. Channels whose subscribers have all unsubscribed are purged here,
    /// on the next subscription, instead of by a background task.
    pub fn subscribe(&self, channel: &str) -> Subscription {
        self.purge_idle();
        let rx = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .value()
            .subscribe();
        Subscription {
            channel: channel.to_string(),
            rx,
        }
    }

    /// Hands an inbound frame to the subscribers of its channel, if any.
    /// Returns the number of subscribers that received it.
    pub fn dispatch(&self, frame: WireFrame) -> usize {
        let Some(sender) = self.channels.get(&frame.event) else {
            debug!("No local subscribers for '{}'.", frame.event);
            return 0;
        };
        sender.send(frame.data).unwrap_or(0)
    }

    /// Removes channels that no longer have any subscribers.
    fn purge_idle(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }

    /// The number of channels with at least one live subscriber.
    pub fn active_channels(&self) -> usize {
        self.channels
            .iter()
            .filter(|e| e.value().receiver_count() > 0)
            .count()
    }
}

/// A live subscription to one channel. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    rx: broadcast::Receiver<Value>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Waits for the next payload on this channel. Returns `None` once the
    /// connector is gone and no further events can arrive. A subscriber that
    /// lags simply misses the dropped events; delivery is best-effort.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(num_lagged)) => {
                    warn!(
                        "Subscription '{}' lagged, {} events dropped.",
                        self.channel, num_lagged
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
