// src/server/mod.rs

use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod spawner;
mod stream;

pub use stream::AnyStream;

/// A relay instance that has bound its listener but not yet started serving.
///
/// Splitting bind from serve keeps the relay testable in isolation: a test
/// binds to an ephemeral port, reads the resolved address, keeps a shutdown
/// handle, and then drives `serve` on its own task.
pub struct BoundServer {
    ctx: context::ServerContext,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// The address the listener actually bound, with any ephemeral port resolved.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that stops the server when signalled.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.ctx.shutdown_tx.clone()
    }

    /// The shared state of this instance, for introspection.
    pub fn state(&self) -> Arc<ServerState> {
        self.ctx.state.clone()
    }

    /// Runs the accept loop until a signal or the shutdown handle fires.
    pub async fn serve(mut self) -> Result<()> {
        spawner::spawn_all(&mut self.ctx)?;
        connection_loop::run(self.ctx).await;
        Ok(())
    }
}

/// Initializes server state, TLS, and the listener for the given configuration.
pub async fn bind(config: Config) -> Result<BoundServer> {
    let ctx = initialization::setup(config).await?;
    let local_addr = ctx.listener.local_addr()?;
    Ok(BoundServer { ctx, local_addr })
}

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    bind(config).await?.serve().await
}
