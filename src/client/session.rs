// src/client/session.rs

//! The boundary to the authentication/session collaborator, and the watcher
//! that turns a `force logout` broadcast into a local session termination.

use super::connector::RelayConnector;
use crate::core::events;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What the connector needs from the session collaborator: the authenticated
/// user id to filter broadcasts against, and a way to end the session.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// The authenticated user id of this browser session.
    fn current_user_id(&self) -> String;

    /// Invalidates the session's credentials and routes the user to the
    /// unauthenticated entry point.
    async fn terminate_session(&self);
}

/// A background watch on the `force logout` channel.
///
/// The relay never filters by recipient: every session receives every
/// logout broadcast and decides relevance locally. Dropping the watch stops
/// it, matching the subscribe-on-mount/unsubscribe-on-unmount discipline of
/// every other subscription.
#[derive(Debug)]
pub struct ForceLogoutWatch {
    handle: JoinHandle<()>,
}

impl ForceLogoutWatch {
    pub fn spawn(connector: &RelayConnector, hooks: Arc<dyn SessionHooks>) -> Self {
        let mut subscription = connector.subscribe(events::FORCE_LOGOUT);
        let handle = tokio::spawn(async move {
            // Latch so a duplicated broadcast terminates the session once.
            let mut terminated = false;
            while let Some(data) = subscription.recv().await {
                let Some(target) = events::logout_target(&data) else {
                    debug!("Ignoring force logout without a target id.");
                    continue;
                };
                if target != hooks.current_user_id() {
                    debug!("Ignoring force logout addressed to '{}'.", target);
                    continue;
                }
                if !terminated {
                    terminated = true;
                    info!("Force logout received for this session; terminating.");
                    hooks.terminate_session().await;
                }
            }
        });
        Self { handle }
    }

    /// Stops watching without touching the session.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ForceLogoutWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
