// src/client/connector.rs

//! Implements the connection half of the client connector.
//!
//! One `RelayConnector` holds exactly one transport connection to the relay
//! for its whole life. A single I/O task multiplexes the outgoing event queue
//! and the inbound frame stream; when the transport drops, the task re-dials
//! with a bounded exponential-backoff policy. Exhausting the attempts leaves
//! the connector permanently degraded: emits are discarded with a debug log
//! and subscriptions stop yielding, but nothing fails loudly, because live
//! updates are a convenience layer and the persistence layer remains the
//! source of truth.

use super::dispatcher::{Dispatcher, Subscription};
use crate::core::RelayError;
use crate::core::events::{self, EntityKind};
use crate::core::protocol::{WireFrame, WireFrameCodec};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

// The initial delay before the first reconnection attempt.
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
// The maximum delay for the exponential backoff reconnection strategy.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);
// How long to wait for the relay's welcome frame before giving up on a dial.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for one connector instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// The relay endpoint as `host:port`.
    pub endpoint: String,
    /// How many times a dial is attempted before the connector degrades.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    #[serde(default = "default_initial_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,
    #[serde(default = "default_max_backoff", with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Per-subscription buffer of the local dispatcher.
    #[serde(default = "default_subscription_capacity")]
    pub subscription_capacity: usize,
}

fn default_reconnect_attempts() -> u32 {
    5
}
fn default_initial_backoff() -> Duration {
    INITIAL_RECONNECT_DELAY
}
fn default_max_backoff() -> Duration {
    MAX_RECONNECT_DELAY
}
fn default_subscription_capacity() -> usize {
    128
}

impl ConnectorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect_attempts: default_reconnect_attempts(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
            subscription_capacity: default_subscription_capacity(),
        }
    }
}

/// A live connection to the relay, shared by all components of one session.
#[derive(Debug)]
pub struct RelayConnector {
    outgoing_tx: mpsc::UnboundedSender<WireFrame>,
    dispatcher: Arc<Dispatcher>,
    connected: Arc<AtomicBool>,
    session_id: u64,
    io_task: JoinHandle<()>,
}

impl RelayConnector {
    /// Dials the relay, completes the welcome handshake, and spawns the I/O
    /// task. The dial itself uses the bounded retry policy, mirroring the
    /// reconnect behavior after a mid-session drop.
    pub async fn connect(config: ConnectorConfig) -> Result<Self, RelayError> {
        let (framed, session_id) = connect_with_retry(&config).await?;
        info!(
            "Connected to relay at {} (session {}).",
            config.endpoint, session_id
        );

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(Dispatcher::new(config.subscription_capacity));
        let connected = Arc::new(AtomicBool::new(true));

        let io_task = tokio::spawn(io_loop(
            framed,
            outgoing_rx,
            dispatcher.clone(),
            connected.clone(),
            config,
        ));

        Ok(Self {
            outgoing_tx,
            dispatcher,
            connected,
            session_id,
            io_task,
        })
    }

    /// Registers a handler for a named channel. Drop the returned handle to
    /// unsubscribe; components do this on unmount without exception.
    pub fn subscribe(&self, channel: &str) -> Subscription {
        self.dispatcher.subscribe(channel)
    }

    /// Sends an event to the relay. Fire-and-forget: while disconnected the
    /// event is dropped, by contract, rather than queued.
    pub fn emit(&self, event: impl Into<String>, data: Value) {
        let frame = WireFrame::new(event, data);
        if !self.connected.load(Ordering::SeqCst) {
            debug!("Relay disconnected; dropping '{}'.", frame.event);
            return;
        }
        if self.outgoing_tx.send(frame).is_err() {
            debug!("Connector I/O task is gone; event dropped.");
        }
    }

    /// Publishes an entity update, used right after a successful local write.
    pub fn emit_update(&self, entity: EntityKind, record: Value) {
        self.emit(entity.update_event(), record);
    }

    /// Whether the underlying transport is currently up. Emits while this is
    /// false are discarded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// The session id assigned by the relay at the initial handshake.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Closes the connection and waits for the I/O task to wind down.
    pub async fn close(self) {
        drop(self.outgoing_tx);
        drop(self.dispatcher);
        let _ = self.io_task.await;
    }
}

/// The single I/O task of a connector: writes queued events, dispatches
/// inbound frames, and re-dials on transport loss.
async fn io_loop(
    mut framed: Framed<TcpStream, WireFrameCodec>,
    mut outgoing_rx: mpsc::UnboundedReceiver<WireFrame>,
    dispatcher: Arc<Dispatcher>,
    connected: Arc<AtomicBool>,
    config: ConnectorConfig,
) {
    loop {
        tokio::select! {
            maybe_frame = outgoing_rx.recv() => {
                match maybe_frame {
                    Some(frame) => {
                        if let Err(e) = framed.send(frame).await {
                            warn!("Failed to send event to relay: {}", e);
                            if !reconnect(&mut framed, &mut outgoing_rx, &connected, &config).await {
                                break;
                            }
                        }
                    }
                    // Every connector handle was dropped; the session is over.
                    None => break,
                }
            }
            inbound = framed.next() => {
                match inbound {
                    Some(Ok(frame)) => {
                        dispatcher.dispatch(frame);
                    }
                    Some(Err(e)) => {
                        warn!("Relay stream error: {}", e);
                        if !reconnect(&mut framed, &mut outgoing_rx, &connected, &config).await {
                            break;
                        }
                    }
                    None => {
                        info!("Relay closed the connection.");
                        if !reconnect(&mut framed, &mut outgoing_rx, &connected, &config).await {
                            break;
                        }
                    }
                }
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
    debug!("Connector I/O task finished.");
}

/// Re-dials after a transport loss. Returns false once the bounded attempts
/// are exhausted, which parks the connector in its degraded end state.
async fn reconnect(
    framed: &mut Framed<TcpStream, WireFrameCodec>,
    outgoing_rx: &mut mpsc::UnboundedReceiver<WireFrame>,
    connected: &AtomicBool,
    config: &ConnectorConfig,
) -> bool {
    connected.store(false, Ordering::SeqCst);
    match connect_with_retry(config).await {
        Ok((new_framed, session_id)) => {
            // Events emitted during the disconnected interval are discarded,
            // not replayed: the UI refreshes from persistence on load anyway.
            let mut discarded = 0u64;
            while outgoing_rx.try_recv().is_ok() {
                discarded += 1;
            }
            if discarded > 0 {
                debug!("Discarded {} events emitted while disconnected.", discarded);
            }
            *framed = new_framed;
            connected.store(true, Ordering::SeqCst);
            info!("Reconnected to relay (session {}).", session_id);
            true
        }
        Err(e) => {
            warn!("Live updates stopped: {}", e);
            false
        }
    }
}

/// Dials the relay up to `reconnect_attempts` times with exponential backoff.
async fn connect_with_retry(
    config: &ConnectorConfig,
) -> Result<(Framed<TcpStream, WireFrameCodec>, u64), RelayError> {
    let mut delay = config.initial_backoff;

    for attempt in 1..=config.reconnect_attempts {
        match connect_once(config).await {
            Ok(ok) => return Ok(ok),
            Err(e) => {
                warn!(
                    "Connection attempt {}/{} to {} failed: {}",
                    attempt, config.reconnect_attempts, config.endpoint, e
                );
            }
        }

        if attempt < config.reconnect_attempts {
            // Jitter to avoid a thundering herd of sessions on relay restart.
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=250));
            tokio::time::sleep(delay + jitter).await;
            delay = (delay * 2).min(config.max_backoff);
        }
    }

    Err(RelayError::ReconnectExhausted(config.reconnect_attempts))
}

/// A single dial: TCP connect plus the welcome handshake.
async fn connect_once(
    config: &ConnectorConfig,
) -> Result<(Framed<TcpStream, WireFrameCodec>, u64), RelayError> {
    let stream = TcpStream::connect(config.endpoint.as_str()).await?;
    let mut framed = Framed::new(stream, WireFrameCodec);

    let welcome = timeout(HANDSHAKE_TIMEOUT, framed.next())
        .await
        .map_err(|_| RelayError::Handshake("timed out waiting for welcome".into()))?
        .ok_or_else(|| RelayError::Handshake("connection closed during handshake".into()))??;

    if welcome.event != events::WELCOME {
        return Err(RelayError::Handshake(format!(
            "expected '{}', got '{}'",
            events::WELCOME,
            welcome.event
        )));
    }

    let session_id = welcome
        .data
        .get("session")
        .and_then(Value::as_u64)
        .unwrap_or_default();
    Ok((framed, session_id))
}
