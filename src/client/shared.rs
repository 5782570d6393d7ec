// src/client/shared.rs

//! A lazily-connected, session-scoped connector handle.
//!
//! Each browser session owns one `SharedConnector`; every component that
//! needs live updates asks it for the connector and gets the same underlying
//! connection. The handle is injected into the session's scope rather than
//! being process-global, so two sessions (or two tests) never share state.

use super::connector::{ConnectorConfig, RelayConnector};
use crate::core::RelayError;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug)]
pub struct SharedConnector {
    config: ConnectorConfig,
    cell: OnceCell<Arc<RelayConnector>>,
}

impl SharedConnector {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Returns the session's connector, dialing the relay on first use.
    /// Concurrent first callers share one dial; later callers reuse the
    /// established connection.
    pub async fn get(&self) -> Result<Arc<RelayConnector>, RelayError> {
        self.cell
            .get_or_try_init(|| async {
                RelayConnector::connect(self.config.clone()).await.map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Whether a connection has been established and is currently up.
    pub fn is_connected(&self) -> bool {
        self.cell.get().is_some_and(|c| c.is_connected())
    }
}
