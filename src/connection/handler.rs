// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a
//! client connection.

use super::guard::ConnectionGuard;
use super::session::SessionState;
use crate::core::events::{self, EntityKind, UserChange};
use crate::core::metrics;
use crate::core::protocol::{WireFrame, WireFrameCodec};
use crate::core::state::ServerState;
use crate::core::RelayError;
use crate::server::AnyStream;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// Manages the full lifecycle of a client connection: sends the welcome
/// handshake, forwards hub broadcasts to the peer, and publishes the peer's
/// change events to the hub.
pub struct ConnectionHandler {
    framed: Framed<AnyStream, WireFrameCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    session_id: u64,
    global_shutdown_rx: broadcast::Receiver<()>,
    hub_rx: broadcast::Receiver<Bytes>,
    session: SessionState,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`. The hub subscription is taken here,
    /// before the welcome frame goes out, so a client that has observed its
    /// welcome is guaranteed to observe every subsequent broadcast.
    pub fn new(
        socket: AnyStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        session_id: u64,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let hub_rx = state.hub.subscribe();
        Self {
            framed: Framed::new(socket, WireFrameCodec),
            addr,
            state,
            session_id,
            global_shutdown_rx,
            hub_rx,
            session: SessionState::new(),
        }
    }

    /// The main event loop for the connection, handling incoming frames,
    /// hub broadcasts, and shutdown signals.
    pub async fn run(&mut self) -> Result<(), RelayError> {
        let _guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);

        let welcome = WireFrame::new(events::WELCOME, json!({ "session": self.session_id }));
        self.framed.send(welcome).await?;

        'main_loop: loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    info!("Connection handler for {} received shutdown signal.", self.addr);
                    let shutdown_msg = WireFrame::new(events::ERROR, Value::String("server is shutting down".into()));
                    let _ = self.framed.send(shutdown_msg).await;
                    break 'main_loop;
                }
                maybe_broadcast = self.hub_rx.recv() => {
                    match maybe_broadcast {
                        Ok(encoded) => {
                            // The frame was encoded once at publish time;
                            // write the bytes straight through.
                            let stream = self.framed.get_mut();
                            if stream.write_all(&encoded).await.is_err() {
                                warn!("Failed to forward broadcast to {}. Connection likely closed.", self.addr);
                                break 'main_loop;
                            }
                            if stream.flush().await.is_err() {
                                break 'main_loop;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(num_lagged)) => {
                            // This subscriber is too slow and missed events.
                            // Per the at-most-once contract the backlog is
                            // dropped; re-subscribe to continue from now.
                            warn!("Subscriber {} lagged, missed {} events. Re-subscribing to continue.", self.addr, num_lagged);
                            metrics::LAGGED_EVENTS_DROPPED_TOTAL.inc_by(num_lagged as f64);
                            self.hub_rx = self.state.hub.subscribe();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("The broadcast hub was closed. Dropping connection {}.", self.addr);
                            break 'main_loop;
                        }
                    }
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            self.session.frames_received += 1;
                            debug!("Session {}: Received frame: {:?}", self.session_id, frame);
                            match self.process_frame(frame) {
                                Ok(()) => self.update_client_last_activity(),
                                Err(e) => self.send_error_to_client(e).await?,
                            }
                        }
                        Some(Err(e @ RelayError::MalformedFrame(_))) => {
                            // Protocol violation. Report the reason, then drop
                            // the connection; the peer's reconnect gives it a
                            // clean stream.
                            self.session.frames_received += 1;
                            warn!("Malformed frame from {}: {}", self.addr, e);
                            let _ = self.send_error_to_client(e).await;
                            break 'main_loop;
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!("Connection from {} closed by peer: {}", self.addr, e);
                            } else {
                                warn!("Connection error for {}: {}", self.addr, e);
                            }
                            break 'main_loop;
                        }
                        None => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            break 'main_loop;
                        }
                    }
                }
            }
        }

        info!(
            "Session {} ({}) disconnected: {} frames in, {} events relayed, {} logouts emitted.",
            self.session_id,
            self.addr,
            self.session.frames_received,
            self.session.events_relayed,
            self.session.logouts_emitted
        );
        Ok(())
    }

    /// Classifies an inbound frame and fans it out.
    ///
    /// Every known `update <entity>` event is rebroadcast verbatim under its
    /// `<entity> updated` name, to all connections including the sender. The
    /// `user` channel additionally derives a `force logout` broadcast when
    /// the record's status parses as inactive.
    fn process_frame(&mut self, frame: WireFrame) -> Result<(), RelayError> {
        let entity = events::classify_inbound(&frame.event)?;

        let updated = WireFrame::new(entity.updated_event(), frame.data);
        let receivers = self.state.hub.publish(&updated)?;
        self.session.events_relayed += 1;
        self.state.stats.increment_total_events();
        let entity_label = entity.to_string();
        metrics::EVENTS_RELAYED_TOTAL
            .with_label_values(&[entity_label.as_str()])
            .inc();
        debug!(
            "Session {}: relayed '{}' to {} subscribers.",
            self.session_id,
            updated.event,
            receivers
        );

        if entity == EntityKind::User {
            let change = UserChange::from_record(&updated.data);
            if change.status.is_inactive() {
                if let Some(id) = change.id {
                    info!(
                        "User {} deactivated; broadcasting force logout.",
                        id
                    );
                    let logout = WireFrame::new(events::FORCE_LOGOUT, Value::String(id));
                    self.state.hub.publish(&logout)?;
                    self.session.logouts_emitted += 1;
                    self.state.stats.increment_total_logouts();
                    metrics::FORCE_LOGOUTS_TOTAL.inc();
                } else {
                    // Nothing to address the logout to; forward-only.
                    debug!(
                        "Session {}: inactive user record without an id, no logout fired.",
                        self.session_id
                    );
                }
            }
        }

        Ok(())
    }

    /// Sends an error frame back to the client. Protocol-level mistakes are
    /// per-frame: the connection itself stays up.
    async fn send_error_to_client(&mut self, e: RelayError) -> Result<(), RelayError> {
        let error_frame = WireFrame::new(events::ERROR, Value::String(e.to_string()));
        debug!(
            "Session {}: Sending error response: {:?}",
            self.session_id, error_frame
        );
        self.framed.send(error_frame).await?;
        Ok(())
    }

    /// Updates the client's last activity time in the registry.
    fn update_client_last_activity(&self) {
        if let Some(mut entry) = self.state.clients.get_mut(&self.session_id) {
            entry.last_event_time = Instant::now();
        }
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &RelayError) -> bool {
    matches!(e, RelayError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
