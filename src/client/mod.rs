// src/client/mod.rs

//! The client connector: per-session logic that maintains one connection to
//! the relay, fans inbound events out to channel subscribers, and reacts to
//! a `force logout` addressed to the session's own user.

pub mod connector;
pub mod dispatcher;
pub mod rows;
pub mod session;
pub mod shared;

pub use connector::{ConnectorConfig, RelayConnector};
pub use dispatcher::{Dispatcher, Subscription};
pub use rows::RowCache;
pub use session::{ForceLogoutWatch, SessionHooks};
pub use shared::SharedConnector;
