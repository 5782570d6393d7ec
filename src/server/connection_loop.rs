// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling
//! graceful shutdown.

use super::context::ServerContext;
use super::stream::AnyStream;
use crate::connection::ConnectionHandler;
use crate::core::metrics;
use crate::core::state::ClientInfo;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// The main server loop that accepts connections and handles graceful shutdown.
pub async fn run(mut ctx: ServerContext) {
    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();
    let max_clients = ctx.state.config.max_clients;

    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to create SIGINT stream");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to create SIGTERM stream");
    // A programmatic stop requested through a shutdown handle breaks the loop
    // the same way a signal does.
    let mut external_shutdown_rx = ctx.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }
            _ = external_shutdown_rx.recv() => {
                info!("Shutdown requested, initiating graceful shutdown.");
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },

            res = ctx.listener.accept() => {
                if let Ok((socket, addr)) = res {
                    if ctx.state.clients.len() >= max_clients {
                        warn!("Connection from {} refused: max_clients ({}) reached.", addr, max_clients);
                        continue;
                    }

                    info!("Accepted new connection from: {}", addr);
                    ctx.state.stats.increment_total_connections();
                    metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
                    metrics::CONNECTED_CLIENTS.inc();

                    session_id_counter = session_id_counter.wrapping_add(1);
                    let session_id = session_id_counter;
                    let state_clone = ctx.state.clone();

                    let global_shutdown_rx = ctx.shutdown_tx.subscribe();
                    state_clone.clients.insert(session_id, ClientInfo::new(addr, session_id));

                    if let Some(acceptor) = ctx.acceptor.clone() {
                        client_tasks.spawn(async move {
                            match acceptor.accept(socket).await {
                                Ok(tls_stream) => {
                                    info!("TLS handshake successful for {addr}");
                                    let any_stream = AnyStream::Tls(Box::new(tls_stream));
                                    let mut handler = ConnectionHandler::new(any_stream, addr, state_clone, session_id, global_shutdown_rx);
                                    if let Err(e) = handler.run().await { warn!("Connection from {} terminated unexpectedly: {}", addr, e); }
                                },
                                Err(e) => {
                                    warn!("TLS handshake error for {addr}: {e}");
                                    // The guard never ran for this connection; undo the registration.
                                    state_clone.clients.remove(&session_id);
                                    metrics::CONNECTED_CLIENTS.dec();
                                }
                            }
                        });
                    } else {
                        client_tasks.spawn(async move {
                            let any_stream = AnyStream::Tcp(socket);
                            let mut handler = ConnectionHandler::new(any_stream, addr, state_clone, session_id, global_shutdown_rx);
                            if let Err(e) = handler.run().await { warn!("Connection from {} terminated unexpectedly: {}", addr, e); }
                        });
                    }
                } else if let Err(e) = res {
                    error!("Failed to accept connection: {}", e);
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res {
                    if e.is_panic() {
                        error!("A client handler panicked: {e:?}");
                    }
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    let _ = ctx.shutdown_tx.send(());

    client_tasks.shutdown().await;
    info!("All client connections closed.");

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!("Server shutdown complete.");
}
